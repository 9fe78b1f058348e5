//! Care Assist — conversational scheduling core.
//!
//! Classifies free-text utterances, drives one of the mutually exclusive
//! scheduling flows, and manages the hold → booking lifecycle against a
//! backend scheduling service. Rendering is out of scope: UIs observe the
//! session transcript and state exposed by [`controller::FlowController`].

pub mod api;
pub mod booking;
pub mod classify;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod geo;
pub mod insurance;
pub mod session;
pub mod suggest;
pub mod triage;
