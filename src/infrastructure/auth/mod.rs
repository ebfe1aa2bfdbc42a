//! Authentication infrastructure module
//!
//! Session token issuance/verification and failed-login throttling.

mod throttle;
mod token;

pub use throttle::{AttemptState, AttemptThrottle, ThrottlePolicy, TimeRemaining};
pub use token::{TokenClaims, TokenCodec, TokenConfig, TokenIssuer};
