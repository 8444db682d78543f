use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::{Connection, Transaction, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::ExtractArgs;
use crate::commands::inventory;
use crate::model::{
    ExtractCounts, ExtractPaths, ExtractRunManifest, PdfEntry, PdfInventoryManifest,
    SolutionRecord,
};
use crate::outline::{TitleRow, flatten_outline};
use crate::pdf::{PageSource, PopplerDocument, PopplerVersions};
use crate::segment::{DtcSegmenter, ExtractedSolutions, SectionBoundary};
use crate::util::{ensure_directory, now_utc_string, read_json, utc_compact_string, write_json_pretty};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

mod db_setup;
mod manual;
mod run;
mod sections;

pub use db_setup::count_rows;
pub use run::run;

use db_setup::*;
use manual::*;
use sections::*;
