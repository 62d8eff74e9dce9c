//! The two conversion pipelines: `unpack` (archive to editable tree) and
//! `pack` (editable tree back to archive). They share no state beyond the
//! filesystem paths they read and write.

pub mod pack;
pub mod unpack;
