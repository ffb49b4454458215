use derive_more::Display;
use std::num::ParseIntError;
use std::str::FromStr;

pub mod access;
pub mod auth;
pub mod membership;
pub mod project;
pub mod task;

#[cfg(test)]
pub(crate) mod test_util;

/// Server-assigned project identifier. Raw strings arriving in request paths
/// are parsed into this type exactly once at the API boundary, so the core
/// never handles unvalidated identifiers.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(i32);

impl ProjectId {
    pub fn new(raw: i32) -> ProjectId {
        ProjectId(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl FromStr for ProjectId {
    type Err = ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.parse::<i32>().map(ProjectId)
    }
}

/// Server-assigned task identifier, parsed at the boundary like [ProjectId].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(i32);

impl TaskId {
    pub fn new(raw: i32) -> TaskId {
        TaskId(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.parse::<i32>().map(TaskId)
    }
}
