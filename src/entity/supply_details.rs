use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "supply_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supply_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supply::Entity",
        from = "Column::SupplyId",
        to = "super::supply::Column::Id"
    )]
    Supply,
}

impl Related<super::supply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supply.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
