pub mod guest_link;
pub mod prelude;

pub use guest_link::Entity as GuestLink;
