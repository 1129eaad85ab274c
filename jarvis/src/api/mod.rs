//! Client side of the Jarvis resource API
//!
//! Single-resource calls live on [`ApiClient`]; collection queries follow
//! `next` links through [`Pages`] and come back as a [`Listing`] that says
//! whether the traversal completed.

mod client;
mod error;
pub mod links;
pub mod query;
mod tags;
pub mod transport;

pub use client::{ApiClient, PostOptions};
pub use error::ApiError;
pub use query::{Listing, Pages};
pub use tags::{TagCreation, stub_tag};
pub use transport::{HttpResponse, HttpTransport, Transport};
