//! The product-detail read model: one response document assembling a
//! product with every dependent row the storefront page needs.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProductDetailDoc {
    pub id: i64,
    pub base_name: String,
    pub description: String,
    pub base_price: Decimal,
    pub metadata: serde_json::Value,
    pub category: Option<NamedDoc>,
    pub brand: Option<NamedDoc>,
    pub variants: Vec<DetailVariantDoc>,
    pub specifications: Vec<SpecificationDoc>,
    pub compatibilities: Vec<CompatibilityDoc>,
    pub delivery_time_status: Option<DeliveryDoc>,
    pub faqs: Vec<FaqDoc>,
    pub carousel: Vec<CarouselDoc>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct NamedDoc {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DetailVariantDoc {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub color: String,
    pub stock: i32,
    pub size: String,
    pub images: Vec<ImageDoc>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ImageDoc {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SpecificationDoc {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CompatibilityDoc {
    pub name: String,
    pub product_type: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DeliveryDoc {
    pub shipping_cost: Decimal,
    pub estimated_delivery_time: String,
    pub additional_info: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct FaqDoc {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CarouselDoc {
    pub image: String,
    pub title: String,
    pub description: String,
}

impl ProductDetailDoc {
    #[cfg(test)]
    pub(in crate::api) fn sample_for_tests(base_price: Decimal) -> Self {
        Self {
            id: 1,
            base_name: "Drill".to_string(),
            description: "Cordless drill".to_string(),
            base_price,
            metadata: serde_json::json!({}),
            category: None,
            brand: None,
            variants: vec![DetailVariantDoc {
                id: 1,
                name: "18V".to_string(),
                price: Decimal::new(4499, 2),
                color: "black".to_string(),
                stock: 3,
                size: "standard".to_string(),
                images: Vec::new(),
            }],
            specifications: Vec::new(),
            compatibilities: Vec::new(),
            delivery_time_status: None,
            faqs: Vec::new(),
            carousel: Vec::new(),
        }
    }
}

/// GET /product-detail/{id}
///
/// Every dependent collection is scoped to the product's id. A missing
/// delivery-time status renders as `null` rather than failing the read.
pub(in crate::api) async fn get_product_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetailDoc>>, ApiError> {
    let rid = req_id.0.clone();
    let doc = assemble(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid, &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: doc,
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn assemble(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<ProductDetailDoc>, storefront_db::DbError> {
    let Some(product) = storefront_db::get_product(pool, product_id).await? else {
        return Ok(None);
    };

    let category = match product.category_id {
        Some(id) => storefront_db::get_category(pool, id).await?.map(|c| NamedDoc {
            id: c.id,
            name: c.name,
            description: c.description,
        }),
        None => None,
    };
    let brand = match product.brand_id {
        Some(id) => storefront_db::get_brand(pool, id).await?.map(|b| NamedDoc {
            id: b.id,
            name: b.name,
            description: b.description,
        }),
        None => None,
    };

    let variant_rows = storefront_db::list_variants_for_product(pool, product_id).await?;
    let variant_ids: Vec<i64> = variant_rows.iter().map(|v| v.id).collect();
    let image_rows = storefront_db::list_images_for_variants(pool, &variant_ids).await?;

    let mut images_by_variant: HashMap<i64, Vec<ImageDoc>> = HashMap::new();
    for image in image_rows {
        images_by_variant
            .entry(image.variant_id)
            .or_default()
            .push(ImageDoc {
                id: image.image_id,
                url: image.url,
            });
    }

    let variants = variant_rows
        .into_iter()
        .map(|v| DetailVariantDoc {
            images: images_by_variant.remove(&v.id).unwrap_or_default(),
            id: v.id,
            name: v.name,
            price: v.price,
            color: v.color,
            stock: v.stock,
            size: v.size,
        })
        .collect();

    let specifications = storefront_db::list_specifications(pool, product_id)
        .await?
        .into_iter()
        .map(|s| SpecificationDoc {
            name: s.name,
            value: s.value,
        })
        .collect();

    let compatibilities = storefront_db::list_compatibilities(pool, product_id)
        .await?
        .into_iter()
        .map(|c| CompatibilityDoc {
            name: c.name,
            product_type: c.product_type,
        })
        .collect();

    let delivery_time_status = storefront_db::get_delivery_time_status(pool, product_id)
        .await?
        .map(|d| DeliveryDoc {
            shipping_cost: d.shipping_cost,
            estimated_delivery_time: d.estimated_delivery_time,
            additional_info: d.additional_info,
        });

    let faqs = storefront_db::list_faqs(pool, product_id)
        .await?
        .into_iter()
        .map(|f| FaqDoc {
            question: f.question,
            answer: f.answer,
        })
        .collect();

    let carousel = storefront_db::list_carousel_entries(pool, product_id)
        .await?
        .into_iter()
        .map(|c| CarouselDoc {
            image: c.image,
            title: c.title,
            description: c.description,
        })
        .collect();

    Ok(Some(ProductDetailDoc {
        id: product.id,
        base_name: product.base_name,
        description: product.description,
        base_price: product.base_price,
        metadata: product.metadata,
        category,
        brand,
        variants,
        specifications,
        compatibilities,
        delivery_time_status,
        faqs,
        carousel,
    }))
}
