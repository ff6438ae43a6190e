use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::Filter;

use crate::{CreateRequest, UpdateRequest, db::Db, handlers};

fn with_db(db: Db) -> impl Filter<Extract = (Db,), Error = Infallible> + Clone {
    warp::any().map(move || db.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

/// Path segments arrive percent-encoded.
fn decode(code: &str) -> String {
    url_escape::decode(code).into_owned()
}

fn health() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get().and(warp::path::end()).and_then(handlers::health)
}

fn redirect(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path!("q" / String))
        .and(with_db(db))
        .and_then(|code: String, db: Db| async move { handlers::redirect(&decode(&code), db).await })
}

fn create(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path!("api" / "create"))
        .and(json_body::<CreateRequest>())
        .and(with_db(db))
        .and_then(handlers::create)
}

fn update(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path!("api" / "update"))
        .and(json_body::<UpdateRequest>())
        .and(with_db(db))
        .and_then(handlers::update)
}

fn delete(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::delete()
        .and(warp::path!("api" / "delete" / String))
        .and(with_db(db))
        .and_then(|code: String, db: Db| async move { handlers::delete(&decode(&code), db).await })
}

fn list(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "list"))
        .and(with_db(db))
        .and_then(handlers::list)
}

/// Every endpoint, open to cross-origin callers from anywhere.
pub fn get_routes(db: Db) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_headers(vec![
            "accept",
            "accept-language",
            "authorization",
            "content-language",
            "content-type",
            "origin",
            "x-requested-with",
        ]);

    health()
        .or(redirect(db.clone()))
        .or(create(db.clone()))
        .or(update(db.clone()))
        .or(delete(db.clone()))
        .or(list(db))
        .with(cors)
        .with(warp::trace::request())
}
