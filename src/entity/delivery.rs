use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "delivery")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sale_id: Uuid,
    pub courier_id: i32,
    pub address_id: Option<Uuid>,
    pub approved_address_id: Option<i32>,
    /// Rendered address at checkout time; survives address edits.
    pub shipping_address: String,
    pub fee: i64,
    pub status_id: i32,
    pub tracking_number: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    #[sea_orm(has_many = "super::delivery_history::Entity")]
    DeliveryHistory,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::delivery_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
