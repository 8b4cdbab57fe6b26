use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sale")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
    pub payment_method: String,
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
    #[sea_orm(has_many = "super::sale_details::Entity")]
    SaleDetails,
    #[sea_orm(has_one = "super::delivery::Entity")]
    Delivery,
}

impl Related<super::user_employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEmployee.def()
    }
}

impl Related<super::sale_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleDetails.def()
    }
}

impl Related<super::delivery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Delivery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
