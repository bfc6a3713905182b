// Popular Search Keyword Ranking - Library Core
//
// This crate counts how often search keywords are requested and serves
// "most popular keywords" rankings, globally and per location. Counting
// degrades through a chain of storage tiers (shared cache → in-process
// tallies → relational storage) and a scheduled backup task reconciles
// the volatile tier into the durable one.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use common::types::{PopularKeywords, RankedKeyword, TierLabel};
pub use config::*;
pub use domains::keywords::{KeywordCountBackup, KeywordRankingRuntime, KeywordRankingService};
pub use kernel::traits::BaseKeywordStore;
