use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_cart")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
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
