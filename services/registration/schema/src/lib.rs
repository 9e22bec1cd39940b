//! sea-orm entities for the registration service.

pub mod pending_registrations;
pub mod registration_tickets;
