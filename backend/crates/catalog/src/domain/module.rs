//! Module Entity
//!
//! A course module. `updated_at` moves with every successful update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{Id, ModuleId};
use kernel::pagination::read_string;
use kernel::validation::{Validate, Validator};
use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, check_name, check_positive};
use crate::domain::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
    pub module_name: String,
    pub module_duration: Runtime,
    pub exam_type: String,
    pub version: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInput {
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub module_duration: Runtime,
    #[serde(default)]
    pub exam_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    pub module_name: Option<String>,
    pub module_duration: Option<Runtime>,
    pub exam_type: Option<String>,
}

/// `?moduleName=` full-text, `?examType=` exact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilter {
    pub module_name: Option<String>,
    pub exam_type: Option<String>,
}

impl Validate for Module {
    fn validate(&self, v: &mut Validator) {
        check_name(v, "moduleName", &self.module_name);
        check_positive(v, "moduleDuration", self.module_duration.minutes().into());
        v.check(!self.exam_type.is_empty(), "examType", "must be provided");
    }
}

impl Resource for Module {
    type Input = ModuleInput;
    type Patch = ModulePatch;

    const SINGULAR: &'static str = "module";
    const PLURAL: &'static str = "modules";
    const PATH: &'static str = "/modules";

    fn create(input: ModuleInput) -> Self {
        let now = Utc::now();
        Self {
            id: Id::from_db(0),
            created_at: now,
            updated_at: now,
            module_name: input.module_name,
            module_duration: input.module_duration,
            exam_type: input.exam_type,
            version: 0,
        }
    }

    fn apply(&mut self, patch: ModulePatch) {
        if let Some(module_name) = patch.module_name {
            self.module_name = module_name;
        }
        if let Some(module_duration) = patch.module_duration {
            self.module_duration = module_duration;
        }
        if let Some(exam_type) = patch.exam_type {
            self.exam_type = exam_type;
        }
    }

    fn parse_filter(query: &HashMap<String, String>, _v: &mut Validator) -> ModuleFilter {
        ModuleFilter {
            module_name: read_string(query, "moduleName"),
            exam_type: read_string(query, "examType"),
        }
    }
}
