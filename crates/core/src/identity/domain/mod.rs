pub mod identity_registry;
