//! Department Entity
//!
//! Each department belongs to exactly one module (`module_id`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{DepartmentId, Id, ModuleId};
use kernel::pagination::read_string;
use kernel::validation::{Validate, Validator};
use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, check_name, check_positive};

/// Foreign key from `departments.module_id` to `modules.id`
pub const DEPARTMENTS_MODULE_FK: &str = "departments_module_id_fkey";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub department_name: String,
    pub staff_quantity: i64,
    pub department_director: String,
    pub module_id: ModuleId,
    pub version: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInput {
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub staff_quantity: i64,
    #[serde(default)]
    pub department_director: String,
    /// Unchecked here; zero or negative fails validation
    #[serde(default)]
    pub module_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPatch {
    pub department_name: Option<String>,
    pub staff_quantity: Option<i64>,
    pub department_director: Option<String>,
    pub module_id: Option<i64>,
}

/// `?departmentName=` full-text, `?moduleId=` exact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFilter {
    pub department_name: Option<String>,
    pub module_id: Option<ModuleId>,
}

impl Validate for Department {
    fn validate(&self, v: &mut Validator) {
        check_name(v, "departmentName", &self.department_name);
        check_positive(v, "staffQuantity", self.staff_quantity);
        v.check(
            !self.department_director.is_empty(),
            "departmentDirector",
            "must be provided",
        );
        check_positive(v, "moduleId", self.module_id.get());
    }
}

impl Resource for Department {
    type Input = DepartmentInput;
    type Patch = DepartmentPatch;

    const SINGULAR: &'static str = "department";
    const PLURAL: &'static str = "departments";
    const PATH: &'static str = "/departments";

    fn create(input: DepartmentInput) -> Self {
        Self {
            id: Id::from_db(0),
            created_at: Utc::now(),
            department_name: input.department_name,
            staff_quantity: input.staff_quantity,
            department_director: input.department_director,
            module_id: Id::from_db(input.module_id),
            version: 0,
        }
    }

    fn apply(&mut self, patch: DepartmentPatch) {
        if let Some(department_name) = patch.department_name {
            self.department_name = department_name;
        }
        if let Some(staff_quantity) = patch.staff_quantity {
            self.staff_quantity = staff_quantity;
        }
        if let Some(department_director) = patch.department_director {
            self.department_director = department_director;
        }
        if let Some(module_id) = patch.module_id {
            self.module_id = Id::from_db(module_id);
        }
    }

    fn parse_filter(query: &HashMap<String, String>, v: &mut Validator) -> DepartmentFilter {
        let module_id = read_string(query, "moduleId").and_then(|raw| match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                v.add_error("moduleId", "must be a positive integer");
                None
            }
        });

        DepartmentFilter {
            department_name: read_string(query, "departmentName"),
            module_id,
        }
    }

    fn reference_error(constraint: &str) -> Option<(&'static str, &'static str)> {
        (constraint == DEPARTMENTS_MODULE_FK).then_some(("moduleId", "must reference an existing module"))
    }
}
