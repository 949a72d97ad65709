pub mod impersonate;
pub mod tenants;
pub mod users;

pub use impersonate::impersonate;
pub use tenants::create_tenant;
pub use users::{list_users, update_role};
