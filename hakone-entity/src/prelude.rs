pub use super::guest_link::Entity as GuestLink;
