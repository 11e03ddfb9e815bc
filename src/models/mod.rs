pub mod app_state;
pub mod instance;
pub mod os_image;
pub mod product;
pub mod region;
pub mod ssh_key;
pub mod user;

pub use app_state::SharedState;
pub use instance::Instance;
pub use os_image::OsImage;
pub use product::Product;
pub use region::Region;
pub use ssh_key::SshKey;
pub use user::{CurrentUser, Role, UserRecord};
