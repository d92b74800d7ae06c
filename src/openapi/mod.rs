use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PCX Marketplace API",
        version = "1.0.0",
        description = r#"
# PCX Marketplace API

Backend for a multi-vendor shop: accounts, catalog, wishlists, orders,
ratings, product relationships, recommendations and dashboards.

## Authentication

`POST /login` returns an access and a refresh token. Send the access token as

```
Authorization: Bearer <access-token>
```

`/login` always answers 200 and reports failures as `{"bool": false, "msg": ...}`.
Every other endpoint uses HTTP status codes and the error body below.

## Error Handling

```json
{
  "error": "Not Found",
  "message": "Not found: Product 550e8400-e29b-41d4-a716-446655440000 not found",
  "request_id": "5b7c0c7e-8d0e-4a55-9a57-3d3a4b5f2e11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "vendors", description = "Vendor records and vendor self-service"),
        (name = "customers", description = "Customer records"),
        (name = "catalog", description = "Categories, products and images"),
        (name = "relationships", description = "Explicit product relationships"),
        (name = "interactions", description = "Interaction tracking, statistics and recommendations"),
        (name = "orders", description = "Orders and order lines"),
        (name = "addresses", description = "Customer addresses"),
        (name = "wishlist", description = "Wishlists"),
        (name = "ratings", description = "Product ratings"),
        (name = "dashboard", description = "Customer and vendor summaries")
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,

        handlers::vendors::list_vendors,
        handlers::vendors::create_vendor,
        handlers::vendors::get_vendor,
        handlers::vendors::update_vendor,
        handlers::vendors::delete_vendor,
        handlers::vendors::own_products,
        handlers::vendors::create_own_product,
        handlers::vendors::own_statistics,

        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        handlers::categories::list_categories,
        handlers::categories::categories_with_stats,
        handlers::categories::create_category,
        handlers::categories::get_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,

        handlers::products::list_products,
        handlers::products::vendor_products,
        handlers::products::get_product,
        handlers::products::related,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::list_images,
        handlers::products::add_image,
        handlers::products::get_image,
        handlers::products::delete_image,

        handlers::related_products::list_edges,
        handlers::related_products::create_edge,
        handlers::related_products::get_edge,
        handlers::related_products::update_edge,
        handlers::related_products::delete_edge,

        handlers::interactions::record_interaction,
        handlers::interactions::list_interactions,
        handlers::interactions::get_interaction,
        handlers::interactions::delete_interaction,
        handlers::interactions::product_statistics,
        handlers::interactions::recommendations,

        handlers::orders::list_orders,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::delete_order,
        handlers::orders::update_item_status,

        handlers::addresses::list_addresses,
        handlers::addresses::customer_addresses,
        handlers::addresses::create_address,
        handlers::addresses::get_address,
        handlers::addresses::update_address,
        handlers::addresses::delete_address,

        handlers::wishlist::list_items,
        handlers::wishlist::add_item,
        handlers::wishlist::get_item,
        handlers::wishlist::remove_item,
        handlers::wishlist::user_wishlist,

        handlers::ratings::list_ratings,
        handlers::ratings::create_rating,
        handlers::ratings::get_rating,
        handlers::ratings::update_rating,
        handlers::ratings::delete_rating,

        handlers::dashboard::customer_dashboard,
        handlers::dashboard::vendor_dashboard,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::auth::TokenPair,
        crate::entities::RelationKind,
        crate::services::accounts::AccountRole,
        crate::services::interactions::InteractionKind,
    ))
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_marketplace_routes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("PCX Marketplace API"));
        assert!(json.contains("/customer/dashboard/{id}"));
        assert!(json.contains("/product-statistics/{product_id}"));
        assert!(json.contains("\"Bearer\""));
    }
}
