//! The content script as it runs in the extension: the live document,
//! `chrome.storage.local`, and `chrome.runtime.onMessage`.

use crate::config::toml_config::CleanerConfig;
use crate::core::script::ContentScript;
use crate::domain::model::{
    ChangeCategories, MutationBatch, MutationKind, MutationRecord, ReloadOutcome, RetryToken,
    SubscriptionId, UserPreferences,
};
use crate::domain::ports::{MutationHub, PageDom, PreferenceStore, RetryScheduler};
use crate::utils::error::{CleanerError, Result};
use crate::utils::logger;
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect, JSON};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlElement, MutationObserver, MutationObserverInit, Window};

type WebScript = ContentScript<WebPage, ChromeStorage>;

thread_local! {
    static SCRIPT: RefCell<Option<WebScript>> = const { RefCell::new(None) };
}

fn current_script() -> Option<WebScript> {
    SCRIPT.with(|slot| slot.borrow().clone())
}

fn js_error(context: &str, value: JsValue) -> CleanerError {
    CleanerError::DeliveryError {
        message: format!("{}: {:?}", context, value),
    }
}

fn storage_error(context: &str, value: JsValue) -> CleanerError {
    CleanerError::StorageError {
        message: format!("{}: {:?}", context, value),
    }
}

struct Registration {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

pub struct WebPage {
    window: Window,
    document: Document,
    observers: HashMap<SubscriptionId, Registration>,
    timers: HashMap<RetryToken, i32>,
    next_handle: u64,
}

impl WebPage {
    pub fn new(window: Window) -> Result<Self> {
        let document = window.document().ok_or_else(|| CleanerError::DeliveryError {
            message: "window has no document".to_string(),
        })?;
        Ok(Self {
            window,
            document,
            observers: HashMap::new(),
            timers: HashMap::new(),
            next_handle: 0,
        })
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Records whose target is a text node are attributed to its parent element.
fn convert_records(records: &Array) -> Vec<MutationRecord<Element>> {
    records
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|record| {
            let kind = match record.type_().as_str() {
                "childList" => MutationKind::ChildList,
                "characterData" => MutationKind::CharacterData,
                _ => return None,
            };
            let node = record.target()?;
            let target = match node.dyn_ref::<Element>() {
                Some(element) => element.clone(),
                None => node.parent_element()?,
            };
            Some(MutationRecord {
                kind,
                target,
                added_nodes: record.added_nodes().length() as usize,
                removed_nodes: record.removed_nodes().length() as usize,
            })
        })
        .collect()
}

impl PageDom for WebPage {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            tracing::debug!("Invalid selector: {}", selector);
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn is_attached(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn remove(&mut self, node: &Element) -> bool {
        if !node.is_connected() {
            return false;
        }
        node.remove();
        true
    }

    fn upsert_style(&mut self, style_id: &str, css: &str) {
        let style = match self.document.get_element_by_id(style_id) {
            Some(existing) => existing,
            None => {
                let created = match self.document.create_element("style") {
                    Ok(created) => created,
                    Err(e) => {
                        tracing::error!("Failed to create <style id={}>: {:?}", style_id, e);
                        return;
                    }
                };
                created.set_id(style_id);
                let parent: Option<Element> = self
                    .document
                    .head()
                    .map(Element::from)
                    .or_else(|| self.document.document_element());
                if let Some(parent) = parent {
                    if let Err(e) = parent.append_child(&created) {
                        tracing::error!("Failed to attach <style id={}>: {:?}", style_id, e);
                    }
                }
                created
            }
        };
        style.set_text_content(Some(css));
    }

    fn remove_inline_property(&mut self, node: &Element, property: &str) -> bool {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return false;
        };
        let style = element.style();
        let was_set = style
            .get_property_value(property)
            .map(|value| !value.is_empty())
            .unwrap_or(false);
        if !was_set {
            return false;
        }
        match style.remove_property(property) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to remove inline {}: {:?}", property, e);
                false
            }
        }
    }

    fn scroll_to_bottom(&mut self, node: &Element) {
        node.set_scroll_top(node.scroll_height());
    }

    fn reload(&mut self) -> ReloadOutcome {
        if let Err(e) = self.window.location().reload() {
            tracing::error!("Page reload failed: {:?}", e);
        }
        ReloadOutcome::Navigating
    }
}

impl MutationHub for WebPage {
    fn observe(&mut self, target: &Element, categories: ChangeCategories) -> SubscriptionId {
        let id = SubscriptionId(self.next_handle());

        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let batch = MutationBatch {
                    subscription: id,
                    records: convert_records(&records),
                };
                if let Some(script) = current_script() {
                    script.on_mutations(batch);
                }
            },
        );

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                tracing::error!("MutationObserver unavailable: {:?}", e);
                return id;
            }
        };

        let init = MutationObserverInit::new();
        init.set_child_list(categories.child_list);
        init.set_subtree(categories.subtree);
        init.set_character_data(categories.character_data);
        if let Err(e) = observer.observe_with_options(target, &init) {
            tracing::error!("Failed to observe {:?}: {:?}", id, e);
            return id;
        }

        self.observers.insert(
            id,
            Registration {
                observer,
                _callback: callback,
            },
        );
        id
    }

    fn disconnect(&mut self, subscription: SubscriptionId) {
        if let Some(registration) = self.observers.remove(&subscription) {
            registration.observer.disconnect();
        }
    }
}

impl RetryScheduler for WebPage {
    fn schedule_retry(&mut self, delay: Duration) -> RetryToken {
        let token = RetryToken(self.next_handle());
        let fire = Closure::once_into_js(move || {
            if let Some(script) = current_script() {
                script.on_retry(token);
            }
        });

        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(fire.unchecked_ref(), millis)
        {
            Ok(handle) => {
                self.timers.insert(token, handle);
            }
            Err(e) => tracing::error!("setTimeout failed: {:?}", e),
        }
        token
    }

    fn cancel_retry(&mut self, token: RetryToken) {
        if let Some(handle) = self.timers.remove(&token) {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

/// `chrome.storage.local`, reached through `Reflect` since it has no web-sys binding.
#[derive(Debug, Clone, Default)]
pub struct ChromeStorage;

impl ChromeStorage {
    fn area() -> Result<JsValue> {
        let mut value: JsValue = js_sys::global().into();
        for key in ["chrome", "storage", "local"] {
            value = Reflect::get(&value, &JsValue::from_str(key))
                .map_err(|e| storage_error(key, e))?;
            if value.is_undefined() {
                return Err(CleanerError::StorageError {
                    message: format!("chrome.storage.local unavailable (missing {})", key),
                });
            }
        }
        Ok(value)
    }

    async fn call(method: &str, argument: &JsValue) -> Result<JsValue> {
        let area = Self::area()?;
        let function: Function = Reflect::get(&area, &JsValue::from_str(method))
            .and_then(|value| value.dyn_into())
            .map_err(|e| storage_error(method, e))?;
        let promise: Promise = function
            .call1(&area, argument)
            .and_then(|value| value.dyn_into())
            .map_err(|e| storage_error(method, e))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| storage_error(method, e))
    }
}

#[async_trait(?Send)]
impl PreferenceStore for ChromeStorage {
    async fn load(&self) -> Result<UserPreferences> {
        let keys: Array = ["cleanModeEnabled", "fontSizePx", "cleanMode", "fontSize"]
            .iter()
            .map(|key| JsValue::from_str(key))
            .collect();
        let stored = Self::call("get", &keys).await?;
        let text: String = JSON::stringify(&stored)
            .map_err(|e| storage_error("stringify", e))?
            .into();
        Ok(serde_json::from_str(&text)?)
    }

    async fn save(&self, prefs: &UserPreferences) -> Result<()> {
        let items = JSON::parse(&serde_json::to_string(prefs)?)
            .map_err(|e| storage_error("parse", e))?;
        Self::call("set", &items).await?;
        Ok(())
    }
}

async fn answer(script: WebScript, message: JsValue, respond: Function) {
    let decoded = JSON::stringify(&message)
        .map_err(|e| js_error("stringify", e))
        .and_then(|text| Ok(serde_json::from_str::<serde_json::Value>(&String::from(text))?));

    let ack = match decoded {
        Ok(value) => script.handle_message(value).await,
        Err(e) => Err(e),
    };

    let ack = match ack {
        Ok(ack) => ack,
        Err(e) => {
            tracing::error!("Command failed: {} ({})", e, e.recovery_suggestion());
            return;
        }
    };

    match serde_json::to_string(&ack)
        .map_err(CleanerError::from)
        .and_then(|text| JSON::parse(&text).map_err(|e| js_error("parse", e)))
    {
        Ok(response) => {
            if let Err(e) = respond.call1(&JsValue::NULL, &response) {
                tracing::warn!("Popup closed before the ack was sent: {:?}", e);
            }
        }
        Err(e) => tracing::error!("Failed to encode ack: {}", e),
    }
}

fn listen_for_messages() -> Result<()> {
    let mut events: JsValue = js_sys::global().into();
    for key in ["chrome", "runtime", "onMessage"] {
        events = Reflect::get(&events, &JsValue::from_str(key)).map_err(|e| js_error(key, e))?;
    }
    let add_listener: Function = Reflect::get(&events, &JsValue::from_str("addListener"))
        .and_then(|value| value.dyn_into())
        .map_err(|e| js_error("addListener", e))?;

    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> JsValue>::new(
        |message: JsValue, _sender: JsValue, respond: Function| {
            let Some(script) = current_script() else {
                return JsValue::FALSE;
            };
            spawn_local(answer(script, message, respond));
            // 非同步回覆，保持訊息通道開啟
            JsValue::TRUE
        },
    );
    add_listener
        .call1(&events, listener.as_ref())
        .map_err(|e| js_error("addListener", e))?;
    listener.forget();
    Ok(())
}

fn install() -> Result<WebScript> {
    let window = web_sys::window().ok_or_else(|| CleanerError::DeliveryError {
        message: "no window".to_string(),
    })?;
    let page = WebPage::new(window)?;
    let script = ContentScript::new(page, ChromeStorage, &CleanerConfig::default());
    SCRIPT.with(|slot| *slot.borrow_mut() = Some(script.clone()));
    listen_for_messages()?;
    Ok(script)
}

#[wasm_bindgen(start)]
pub fn start() {
    logger::init_console_logger();
    tracing::info!("Clean mode content script loaded");

    let script = match install() {
        Ok(script) => script,
        Err(e) => {
            tracing::error!("{}", e.user_friendly_message());
            return;
        }
    };

    spawn_local(async move {
        if let Err(e) = script.boot().await {
            tracing::error!("Startup check failed: {}", e);
        }
    });
}
