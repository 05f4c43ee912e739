//! Integration tests driving the HTTP backend client and the engine against a local fake of the
//! monitoring backend.

mod server;
mod test_engine;
mod test_http;
