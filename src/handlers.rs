use std::convert::Infallible;

use warp::http::StatusCode;

use crate::{
    ApiResponse, CreateRequest, UpdateRequest,
    db::{self, DbError},
    hash, model,
};

const NOT_FOUND_MESSAGE: &str = "QR Code not found";

fn json(body: &ApiResponse, status: StatusCode) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(Box::new(warp::reply::with_status(warp::reply::json(body), status)))
}

fn internal_error(e: impl std::fmt::Display) -> Result<Box<dyn warp::Reply>, Infallible> {
    tracing::error!("{e}");
    let reply = warp::reply::with_status(warp::reply(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(Box::new(reply))
}

/// Escapes characters a `Location` header cannot carry (spaces, quotes, non-ASCII),
/// leaving existing `%XX` sequences alone.
fn location(url: &str) -> Result<warp::http::Uri, warp::http::uri::InvalidUri> {
    url_escape::encode_fragment(url).parse()
}

/// `GET /q/{code}`: counts the scan and sends the client on to the stored url.
pub async fn redirect(code: &str, db: db::Db) -> Result<Box<dyn warp::Reply>, Infallible> {
    let record = match db.record.get(code).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::debug!("no record for code: {}", code);
            return Ok(Box::new(warp::reply::with_status(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND)));
        }
        Err(e) => return internal_error(e),
    };

    // the scan is counted even if the client never follows the redirect
    match db.record.increment_scan(code).await {
        Ok(()) => {}
        Err(DbError::NotFound(_)) => tracing::warn!("record {} deleted during scan", code),
        Err(e) => return internal_error(e),
    }

    match location(&record.url) {
        Ok(location) => Ok(Box::new(warp::reply::with_header(
            warp::redirect::found(location),
            "Cache-Control",
            "no-cache",
        ))),
        Err(e) => internal_error(format!("stored url for {} is not a valid location: {e}", code)),
    }
}

/// `POST /api/create`: stores a new record, replacing any record already at that code.
pub async fn create(request: CreateRequest, db: db::Db) -> Result<Box<dyn warp::Reply>, Infallible> {
    let Some(record) = request.into_record() else {
        return json(&ApiResponse::fail("Missing fields"), StatusCode::BAD_REQUEST);
    };

    tracing::debug!("creating record: {}", &record);
    match db.record.put(&record).await {
        Ok(()) => {
            tracing::info!("created {}", record.fixed_link());
            json(
                &ApiResponse::ok("QR created").with_fixed_link(record.fixed_link()),
                StatusCode::OK,
            )
        }
        Err(e) => internal_error(e),
    }
}

/// `POST /api/update`: changes the destination of a record when the password matches.
pub async fn update(request: UpdateRequest, db: db::Db) -> Result<Box<dyn warp::Reply>, Infallible> {
    let Some((code, password, new_url)) = request.fields() else {
        // 400 is outside the endpoint's usual 404/403 failures
        return json(&ApiResponse::fail("Missing fields"), StatusCode::BAD_REQUEST);
    };

    let record = match db.record.get(code).await {
        Ok(Some(record)) => record,
        Ok(None) => return json(&ApiResponse::fail(NOT_FOUND_MESSAGE), StatusCode::NOT_FOUND),
        Err(e) => return internal_error(e),
    };

    if !hash::verify_password(password, &record.password_hash) {
        tracing::info!("rejected update for {}: incorrect password", code);
        return json(&ApiResponse::fail("Incorrect password"), StatusCode::FORBIDDEN);
    }

    match db.record.update_fields(code, &model::RecordUpdate::url(new_url)).await {
        Ok(()) => {
            tracing::info!("updated {}: {} -> {}", record.fixed_link(), record.url, new_url);
            json(&ApiResponse::ok("Destination updated"), StatusCode::OK)
        }
        Err(DbError::NotFound(_)) => json(&ApiResponse::fail(NOT_FOUND_MESSAGE), StatusCode::NOT_FOUND),
        Err(e) => internal_error(e),
    }
}

/// `DELETE /api/delete/{code}`: always reports success, even for unknown codes.
pub async fn delete(code: &str, db: db::Db) -> Result<Box<dyn warp::Reply>, Infallible> {
    match db.record.delete(code).await {
        Ok(()) => {
            tracing::info!("deleted {}", model::fixed_link(code));
            json(&ApiResponse::ok(&format!("{} deleted", code)), StatusCode::OK)
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /api/list`: every record, digest included.
pub async fn list(db: db::Db) -> Result<Box<dyn warp::Reply>, Infallible> {
    match db.record.list_all().await {
        Ok(records) => Ok(Box::new(warp::reply::json(&records))),
        Err(e) => internal_error(e),
    }
}

pub async fn health() -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(Box::new("QR Backend is running"))
}
