//! Browser host, enabled with the `wasm` feature.
//!
//! [`DomNode`] wraps the element a widget renders into. [`ScriptLoader`]
//! injects an engine's stylesheets and scripts into the document head and
//! resolves once the library reports itself ready, either through the
//! script's `load` event or through a page-level callback whose name is
//! unique to the requesting widget.

use crate::{
    engine::LibrarySpec,
    traits::{AssetLoader, HostNode},
    MapError, Result,
};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlScriptElement};

fn host_error(context: &str, err: JsValue) -> MapError {
    MapError::Host(format!("{}: {:?}", context, err))
}

fn document() -> Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| MapError::Host("no document available".to_string()))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Whether a dotted global such as `google.maps` resolves to a value
pub fn global_exists(path: &str) -> bool {
    let mut current: JsValue = js_sys::global().into();
    for part in path.split('.') {
        match js_sys::Reflect::get(&current, &JsValue::from_str(part)) {
            Ok(value) if !value.is_undefined() && !value.is_null() => current = value,
            _ => return false,
        }
    }
    true
}

/// Element hosting a widget
#[derive(Debug, Clone)]
pub struct DomNode {
    element: Element,
}

impl DomNode {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Looks the node up by element id
    pub fn by_id(id: &str) -> Result<Self> {
        document()?
            .get_element_by_id(id)
            .map(Self::new)
            .ok_or_else(|| MapError::Host(format!("no element with id '{}'", id)))
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl HostNode for DomNode {
    fn node_id(&self) -> String {
        self.element.id()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn show_error(&mut self, message: &str) {
        self.element.set_inner_html(&format!(
            "<div class=\"mapbridge-error\">Error: {}</div>",
            escape_html(message)
        ));
    }
}

type Signal = Rc<RefCell<Option<oneshot::Sender<Result<()>>>>>;

fn resolve(signal: &Signal, result: Result<()>) {
    if let Some(tx) = signal.borrow_mut().take() {
        let _ = tx.send(result);
    }
}

/// Where page-level load callbacks live
trait GlobalScope {
    fn remove(&self, name: &str);
}

#[derive(Debug, Clone, Copy)]
struct PageGlobal;

impl GlobalScope for PageGlobal {
    fn remove(&self, name: &str) {
        let _ = js_sys::Reflect::delete_property(&js_sys::global(), &JsValue::from_str(name));
    }
}

/// Removes a page-level callback when dropped. It lives inside the load
/// future, so a load aborted by unbind leaves nothing on `globalThis`.
struct CallbackGuard<S: GlobalScope> {
    scope: S,
    name: String,
}

impl<S: GlobalScope> Drop for CallbackGuard<S> {
    fn drop(&mut self) {
        self.scope.remove(&self.name);
    }
}

/// Injects engine assets into the current document
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptLoader;

impl ScriptLoader {
    fn append_style(document: &Document, href: &str) -> Result<()> {
        let link = document
            .create_element("link")
            .map_err(|e| host_error("create link", e))?;
        link.set_attribute("rel", "stylesheet")
            .map_err(|e| host_error("set rel", e))?;
        link.set_attribute("href", href)
            .map_err(|e| host_error("set href", e))?;
        Self::append_to_head(document, &link)
    }

    fn append_to_head(document: &Document, element: &Element) -> Result<()> {
        let head = document
            .head()
            .ok_or_else(|| MapError::Host("document has no head".to_string()))?;
        head.append_child(element)
            .map_err(|e| host_error("append to head", e))?;
        Ok(())
    }

    /// Appends one script and waits for `onload`, or for the page-level
    /// `callback` when one is given
    async fn append_script(document: &Document, src: &str, callback: Option<&str>) -> Result<()> {
        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|e| host_error("create script", e))?
            .dyn_into()
            .map_err(|_| MapError::Host("script element has unexpected type".to_string()))?;
        script.set_src(src);
        script.set_async(true);

        let (tx, rx) = oneshot::channel();
        let signal: Signal = Rc::new(RefCell::new(Some(tx)));

        let on_ready = {
            let signal = signal.clone();
            Closure::once_into_js(move || resolve(&signal, Ok(())))
        };

        let on_error = {
            let signal = signal.clone();
            let src = src.to_string();
            Closure::once_into_js(move || {
                resolve(&signal, Err(MapError::LoadFailed(format!("failed to fetch {}", src))));
            })
        };

        let element: &HtmlElement = script.as_ref();
        element.set_onerror(Some(on_error.unchecked_ref()));
        let _guard = match callback {
            Some(name) => {
                js_sys::Reflect::set(&js_sys::global(), &JsValue::from_str(name), &on_ready)
                    .map_err(|e| host_error("install load callback", e))?;
                Some(CallbackGuard {
                    scope: PageGlobal,
                    name: name.to_string(),
                })
            }
            None => {
                element.set_onload(Some(on_ready.unchecked_ref()));
                None
            }
        };

        Self::append_to_head(document, &script)?;

        rx.await.unwrap_or(Err(MapError::LoadCancelled))
    }
}

#[async_trait(?Send)]
impl AssetLoader for ScriptLoader {
    fn is_available(&self, library: &LibrarySpec) -> bool {
        global_exists(library.global)
    }

    async fn load(&self, library: LibrarySpec) -> Result<()> {
        let document = document()?;
        for href in &library.styles {
            Self::append_style(&document, href)?;
        }

        let last = library.scripts.len().saturating_sub(1);
        for (i, src) in library.scripts.iter().enumerate() {
            // the ready callback belongs to the final script
            let callback = if i == last {
                library.callback.as_deref()
            } else {
                None
            };
            Self::append_script(&document, src, callback).await?;
        }

        if global_exists(library.global) {
            Ok(())
        } else {
            Err(MapError::EngineUnavailable(library.provider))
        }
    }
}
