//! Static pages

use axum::response::Html;

use crate::views;

pub async fn home() -> Html<String> {
    Html(views::home())
}

pub async fn about() -> Html<String> {
    Html(views::about())
}

pub async fn how_it_works() -> Html<String> {
    Html(views::how_it_works())
}

pub async fn contact() -> Html<String> {
    Html(views::contact())
}
