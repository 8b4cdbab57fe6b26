use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "address")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub barangay_id: i32,
    pub is_default: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_employee::Entity",
        from = "Column::UserId",
        to = "super::user_employee::Column::Id"
    )]
    UserEmployee,
}

impl Related<super::user_employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEmployee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
