use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ward {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWard {
    #[validate(length(min = 1, max = 100, message = "Ward name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bed {
    pub id: i64,
    pub ward_id: i64,
    pub bed_no: String,
    pub is_occupied: bool,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBed {
    pub ward_id: i64,
    #[validate(length(min = 1, max = 20, message = "Bed number is required"))]
    pub bed_no: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BedCounts {
    pub total: i64,
    pub occupied: i64,
    pub available: i64,
}
