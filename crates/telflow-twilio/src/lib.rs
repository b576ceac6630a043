//! telflow-twilio
//!
//! `reqwest` implementation of the telflow provider API client for the
//! Twilio REST APIs.

pub mod client;
pub mod error;

pub use client::{TWILIO_API_BASE, TWILIO_MESSAGING_BASE, TwilioClient};
pub use error::{Result, TwilioError, classify};
