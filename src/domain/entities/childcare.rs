use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::edit::FormRules;
use crate::domain::entities::record::{CellFormat, Collection, Column, FieldValue, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeCapacity {
    pub program_type: String,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: i64,
    #[serde(alias = "classroom_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_type: Option<String>,
    #[serde(alias = "max_capacity")]
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_capacities: Vec<AlternativeCapacity>,
}

impl Classroom {
    pub fn alternatives_summary(&self) -> String {
        self.alternative_capacities
            .iter()
            .map(|alt| format!("{} - {}", alt.program_type, alt.max_capacity))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Record for Classroom {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "name" => FieldValue::text(&self.name),
            "program_type" => FieldValue::optional_text(self.program_type.as_deref()),
            "capacity" => FieldValue::from(self.capacity),
            "alternative_capacities" => FieldValue::Text(self.alternatives_summary()),
            _ => FieldValue::Null,
        }
    }
}

const CLASSROOM_COLUMNS: &[Column] = &[
    Column::new("name", "Classroom"),
    Column::new("program_type", "Program Type").with_format(CellFormat::DashIfEmpty),
    Column::new("capacity", "Max Capacity"),
    Column::new("alternative_capacities", "Alternative Capacities").unsortable(),
];

impl Collection for Classroom {
    const ENDPOINT: &'static str = "api/classrooms/";
    const LABEL: &'static str = "Classrooms";

    fn columns() -> &'static [Column] {
        CLASSROOM_COLUMNS
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("name")
            .require("capacity")
            .default_value("name", json!(""))
            .default_value("capacity", json!(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: i64,
    pub parent_1_name: String,
    #[serde(default)]
    pub parent_1_phone: Option<String>,
    #[serde(default)]
    pub parent_1_email: Option<String>,
    #[serde(default)]
    pub parent_2_name: Option<String>,
    #[serde(default)]
    pub parent_2_phone: Option<String>,
    #[serde(default)]
    pub parent_2_email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Family {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "parent_1_name" => FieldValue::text(&self.parent_1_name),
            "parent_1_phone" => FieldValue::optional_text(self.parent_1_phone.as_deref()),
            "parent_1_email" => FieldValue::optional_text(self.parent_1_email.as_deref()),
            "parent_2_name" => FieldValue::optional_text(self.parent_2_name.as_deref()),
            "parent_2_phone" => FieldValue::optional_text(self.parent_2_phone.as_deref()),
            "parent_2_email" => FieldValue::optional_text(self.parent_2_email.as_deref()),
            "address" => FieldValue::optional_text(self.address.as_deref()),
            "notes" => FieldValue::optional_text(self.notes.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const FAMILY_COLUMNS: &[Column] = &[
    Column::new("parent_1_name", "Parent 1"),
    Column::new("parent_1_phone", "Phone").with_format(CellFormat::DashIfEmpty),
    Column::new("parent_1_email", "Email").with_format(CellFormat::DashIfEmpty),
    Column::new("parent_2_name", "Parent 2").with_format(CellFormat::DashIfEmpty),
    Column::new("address", "Address").with_format(CellFormat::DashIfEmpty),
];

impl Collection for Family {
    const ENDPOINT: &'static str = "api/families/";
    const LABEL: &'static str = "Families";

    fn columns() -> &'static [Column] {
        FAMILY_COLUMNS
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("parent_1_name")
            .require("parent_1_phone")
            .require("parent_1_email")
            .require("address")
    }
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub classroom: Option<i64>,
    #[serde(default)]
    pub classroom_name: Option<String>,
    #[serde(default)]
    pub family: Option<i64>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub allergy_info: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Child {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Child {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "first_name" => FieldValue::text(&self.first_name),
            "last_name" => FieldValue::text(&self.last_name),
            "full_name" => FieldValue::Text(self.full_name()),
            "date_of_birth" => FieldValue::optional_text(self.date_of_birth.as_deref()),
            "classroom" => FieldValue::optional_number(self.classroom),
            "classroom_name" => FieldValue::optional_text(self.classroom_name.as_deref()),
            "family" => FieldValue::optional_number(self.family),
            "is_active" => FieldValue::Bool(self.is_active),
            "allergy_info" => FieldValue::optional_text(self.allergy_info.as_deref()),
            "notes" => FieldValue::optional_text(self.notes.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const CHILD_COLUMNS: &[Column] = &[
    Column::new("first_name", "First Name"),
    Column::new("last_name", "Last Name"),
    Column::new("date_of_birth", "Date of Birth").with_format(CellFormat::DashIfEmpty),
    Column::new("classroom_name", "Classroom").with_format(CellFormat::DashIfEmpty),
    Column::new("is_active", "Status").with_format(CellFormat::ActiveFlag),
    Column::new("allergy_info", "Allergy Info")
        .with_format(CellFormat::DashIfEmpty)
        .unsortable(),
];

impl Collection for Child {
    const ENDPOINT: &'static str = "api/children/";
    const LABEL: &'static str = "Children";

    fn columns() -> &'static [Column] {
        CHILD_COLUMNS
    }

    fn create_path() -> &'static str {
        "api/add-child/"
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("first_name")
            .require("last_name")
            .require("date_of_birth")
            .require("classroom")
            .require_when("family", "existing_family")
            .default_value("first_name", json!(""))
            .default_value("last_name", json!(""))
            .default_value("date_of_birth", json!(""))
            .default_value("existing_family", json!(false))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: i64,
    pub child: i64,
    #[serde(default)]
    pub child_name: Option<String>,
    pub next_classroom: i64,
    #[serde(default)]
    pub next_classroom_name: Option<String>,
    pub transition_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Transition {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "child" => FieldValue::from(self.child),
            "child_name" => FieldValue::optional_text(self.child_name.as_deref()),
            "next_classroom" => FieldValue::from(self.next_classroom),
            "next_classroom_name" => {
                FieldValue::optional_text(self.next_classroom_name.as_deref())
            }
            "transition_date" => FieldValue::text(&self.transition_date),
            "notes" => FieldValue::optional_text(self.notes.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const TRANSITION_COLUMNS: &[Column] = &[
    Column::new("child_name", "Child"),
    Column::new("next_classroom_name", "Next Classroom"),
    Column::new("transition_date", "Transition Date"),
];

impl Collection for Transition {
    const ENDPOINT: &'static str = "api/transitions/";
    const LABEL: &'static str = "Transitions";

    fn columns() -> &'static [Column] {
        TRANSITION_COLUMNS
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("child")
            .require("next_classroom")
            .require("transition_date")
    }
}

pub const WITHDRAWAL_STATUSES: &[(&str, &str)] = &[("refunded", "Refunded"), ("forfeited", "Forfeited")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub child: i64,
    #[serde(default)]
    pub child_name: Option<String>,
    pub withdrawal_date: String,
    #[serde(default, alias = "reason")]
    pub withdrawal_reason: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Withdrawal {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "child" => FieldValue::from(self.child),
            "child_name" => FieldValue::optional_text(self.child_name.as_deref()),
            "withdrawal_date" => FieldValue::text(&self.withdrawal_date),
            "withdrawal_reason" => FieldValue::text(&self.withdrawal_reason),
            "status" => FieldValue::text(&self.status),
            "notes" => FieldValue::optional_text(self.notes.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const WITHDRAWAL_COLUMNS: &[Column] = &[
    Column::new("child_name", "Child"),
    Column::new("withdrawal_date", "Withdrawal Date"),
    Column::new("withdrawal_reason", "Reason"),
    Column::new("status", "Status"),
    Column::new("notes", "Notes")
        .with_format(CellFormat::DashIfEmpty)
        .unsortable(),
];

impl Collection for Withdrawal {
    const ENDPOINT: &'static str = "api/withdrawals/";
    const LABEL: &'static str = "Withdrawals";

    fn columns() -> &'static [Column] {
        WITHDRAWAL_COLUMNS
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("child")
            .require("withdrawal_date")
            .require("withdrawal_reason")
            .require("status")
            .default_value("withdrawal_date", json!(""))
            .default_value("withdrawal_reason", json!(""))
            .default_value("status", json!(""))
            .default_value("notes", json!(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Centre {
    pub id: i64,
    pub name: String,
}

impl Record for Centre {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id),
            "name" => FieldValue::text(&self.name),
            _ => FieldValue::Null,
        }
    }
}

const CENTRE_COLUMNS: &[Column] = &[Column::new("name", "Centre")];

impl Collection for Centre {
    const ENDPOINT: &'static str = "api/centres/";
    const LABEL: &'static str = "Centres";

    fn columns() -> &'static [Column] {
        CENTRE_COLUMNS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::project_rows;

    #[test]
    fn classroom_accepts_backend_field_names() {
        let body = r#"{
            "id": 3,
            "classroom_name": "Sunflower",
            "max_capacity": 12,
            "alternative_capacities": [{"program_type": "Preschool", "max_capacity": 16}]
        }"#;
        let classroom: Classroom = serde_json::from_str(body).expect("classroom should parse");

        assert_eq!(classroom.name, "Sunflower");
        assert_eq!(classroom.capacity, 12);
        assert_eq!(classroom.alternatives_summary(), "Preschool - 16");
        assert_eq!(
            project_rows(&[classroom], Classroom::columns()),
            vec![vec!["Sunflower", "-", "12", "Preschool - 16"]]
        );
    }

    #[test]
    fn child_status_renders_as_label() {
        let body = r#"[
            {"id": 1, "first_name": "Ana", "last_name": "Ruiz"},
            {"id": 2, "first_name": "Bo", "last_name": "Chan", "is_active": false}
        ]"#;
        let children: Vec<Child> = serde_json::from_str(body).expect("children should parse");
        let status = Child::columns()
            .iter()
            .find(|column| column.field == "is_active")
            .expect("status column should exist");

        assert_eq!(status.render(&children[0]), "Active");
        assert_eq!(status.render(&children[1]), "Inactive");
    }

    #[test]
    fn withdrawal_reason_alias_and_status_choices() {
        let body = r#"{"id": 4, "child": 1, "withdrawal_date": "2024-03-01", "reason": "Moving", "status": "refunded"}"#;
        let withdrawal: Withdrawal = serde_json::from_str(body).expect("withdrawal should parse");

        assert_eq!(withdrawal.withdrawal_reason, "Moving");
        assert!(WITHDRAWAL_STATUSES
            .iter()
            .any(|(value, _)| *value == withdrawal.status));
    }
}
