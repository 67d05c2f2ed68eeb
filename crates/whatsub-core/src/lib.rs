//! Whatsub Core Library
//!
//! Raw and typed access to the Airtable user base behind whatsub, plus the
//! subtitle overlay service. The raw fetcher reproduces exactly what the
//! remote said; the typed client turns the same endpoints into record
//! operations. All reporting goes through an injected diagnostics sink.

pub mod cache;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod format;
pub mod formula;
pub mod http;
pub mod overlay;
pub mod types;

pub use client::{AirtableClient, ListOptions};
pub use config::AirtableConfig;
pub use diagnostics::{Diagnostics, MemoryDiagnostics};
pub use error::{Result, WhatsubError};
pub use fetch::TableRecordsFetcher;
pub use http::{RequestDescriptor, ResponseOutcome};
pub use overlay::{BackgroundStyle, FontSize, OverlayPosition, OverlaySettings, SubtitleService};
pub use types::{
    FieldSpec, Record, RecordPage, SelectChoice, SelectOptions, SubscriptionType, TableSchema,
    UserFields,
};
