/*!
This crate contains utilities shared by the amanita crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod table;
