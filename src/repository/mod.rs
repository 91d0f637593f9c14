// Copyright 2023 Remi Bernotavicius

//! The operations the front end performs against the database.
//!
//! Every function takes the one process-wide connection by `&mut` and runs to completion. Database
//! errors are returned as-is; a missing row is `Ok(None)` or `Ok(false)`.

pub mod catalog;
pub mod ingredients;
pub mod menus;
pub mod patients;
pub mod recipes;
