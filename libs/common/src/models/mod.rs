//! Domain models shared by the auth and API services

pub mod booking;
pub mod facility;
pub mod payment;
pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use booking::{Booking, BookingDetails, BookingFacility, BookingStatus, BookingUser, NewBooking};
pub use facility::{Facility, FacilityInput};
pub use payment::{PAYMENT_PAID, Payment, PaymentBooking, PaymentDetails, PaymentUser};
pub use role::{ADMIN_ROLE, DEFAULT_ROLE, Role};
pub use session::{Session, SessionProfile};
pub use user::{NewUser, Profile, UpdateProfile, User};
