// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Global search session.
//!
//! Searches are slow remote calls and a user can type faster than they
//! return. Each request takes a ticket; only the ticket of the most recent
//! request is current, and results for any other ticket are dropped.

use crate::models::PortalType;
use crate::services::remote::{SearchResult, SEARCH_PAGE_SIZE};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Handle for one in-flight search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    pub term: String,
    pub offset: usize,
}

/// Tracks the last requested term and page.
#[derive(Debug, Default)]
pub struct SearchSession {
    last_term: Option<String>,
    offset: usize,
    generation: u64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search for `term` at `offset`, superseding any earlier one.
    pub fn begin(&mut self, term: &str, offset: usize) -> SearchTicket {
        let term = term.trim().to_string();
        if self.last_term.as_deref() != Some(term.as_str()) {
            tracing::debug!(term = %term, "New search term");
        }

        self.generation += 1;
        self.last_term = Some(term.clone());
        self.offset = offset;

        SearchTicket {
            generation: self.generation,
            term,
            offset,
        }
    }

    /// Request the page after the last one. `None` before any search.
    pub fn load_more(&mut self) -> Option<SearchTicket> {
        let term = self.last_term.clone()?;
        let offset = self.offset + SEARCH_PAGE_SIZE;
        Some(self.begin(&term, offset))
    }

    pub fn last_term(&self) -> Option<&str> {
        self.last_term.as_deref()
    }

    /// Whether `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Turn a response into a page, discarding it if it was superseded.
    pub fn complete(&self, ticket: &SearchTicket, results: Vec<SearchHit>) -> SearchPage {
        if !self.is_current(ticket) {
            tracing::debug!(term = %ticket.term, offset = ticket.offset, "Dropping stale search results");
            return SearchPage {
                term: ticket.term.clone(),
                offset: ticket.offset,
                has_more: false,
                superseded: true,
                results: Vec::new(),
            };
        }

        SearchPage {
            term: ticket.term.clone(),
            offset: ticket.offset,
            has_more: results.len() == SEARCH_PAGE_SIZE,
            superseded: false,
            results,
        }
    }
}

/// A search result, annotated with the type of a matching saved portal.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchHit {
    #[serde(flatten)]
    pub result: SearchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_type: Option<PortalType>,
}

/// One page of search results as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchPage {
    pub term: String,
    pub offset: usize,
    /// A full page came back, so another page may exist.
    pub has_more: bool,
    /// A newer search started before this one returned.
    pub superseded: bool,
    pub results: Vec<SearchHit>,
}
