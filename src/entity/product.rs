use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Selling price in centavos.
    pub price: i64,
    /// Latest supply unit cost in centavos.
    pub cost_price: i64,
    pub quantity: i32,
    pub weight_kg: f64,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    /// JSON array of image URLs.
    pub images: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::product_car_compatibility::Entity")]
    ProductCarCompatibility,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_car_compatibility::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCarCompatibility.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
