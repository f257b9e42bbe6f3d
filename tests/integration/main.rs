//! Integration tests for the TutorHub HTTP API.

mod helpers;

mod health_test;
mod presence_test;
mod ws_test;
