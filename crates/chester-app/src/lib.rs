//! Chester App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters and hands the managers to
//! whichever presentation layer embeds it.

mod app;

pub use app::ChesterApp;

use chester_types::config::ChesterConfig;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;


thread_local! {
    static APP: RefCell<Option<Rc<RefCell<ChesterApp>>>> = const { RefCell::new(None) };
}

/// Keep `app` alive for the lifetime of the module and hand back a shared handle.
/// Installing again replaces the previous app.
pub fn install(app: ChesterApp) -> Rc<RefCell<ChesterApp>> {
    let app = Rc::new(RefCell::new(app));
    APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));
    app
}

/// The app installed by [`install`], if any.
pub fn installed() -> Option<Rc<RefCell<ChesterApp>>> {
    APP.with(|slot| slot.borrow().clone())
}

/// WASM entry point, called when the module is instantiated
#[wasm_bindgen(start)]
pub async fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Chester WASM starting...");

    let app = match ChesterApp::from_config(ChesterConfig::from_build_env()) {
        Ok(app) => app,
        Err(e) => {
            log::warn!("Backend not configured ({}); build with CHESTER_* set", e);
            return;
        }
    };
    match app.current_user().await {
        Ok(user) => log::info!("Signed in as {}", user.id),
        Err(_) => log::info!("Ready on {}; waiting for sign-in", app.backend_name()),
    }
    install(app);
}
