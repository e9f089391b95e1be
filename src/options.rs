// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Mount options as declared on a resource.
///
/// Declaration order is kept for display and for the option string handed
/// to the backend, but convergence decisions compare options as a set of
/// literal tokens: "rw,nodev" and "nodev,rw" are the same options,
/// while "rw" and "rw,log=NULL" are not. No default option ("rw", "auto")
/// is ever implied when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MountOptions(Vec<String>);

impl MountOptions {
    /// Parses a comma-separated option string. Empty segments and
    /// surrounding whitespace are dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|tok| tok.trim().to_string())
                .filter(|tok| !tok.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The order-insensitive view used for drift comparison.
    pub fn normalized(&self) -> BTreeSet<String> {
        self.0.iter().cloned().collect()
    }

    pub fn matches(&self, registered: &BTreeSet<String>) -> bool {
        self.normalized() == *registered
    }
}

impl fmt::Display for MountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl From<&str> for MountOptions {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Vec<String>> for MountOptions {
    fn from(list: Vec<String>) -> Self {
        Self(
            list.into_iter()
                .map(|tok| tok.trim().to_string())
                .filter(|tok| !tok.is_empty())
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for MountOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrVec {
            String(String),
            Vec(Vec<String>),
        }

        match StringOrVec::deserialize(deserializer)? {
            StringOrVec::String(s) => Ok(MountOptions::parse(&s)),
            StringOrVec::Vec(v) => Ok(MountOptions::from(v)),
        }
    }
}
