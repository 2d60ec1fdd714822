//! [`ChatView`] over the page's existing message list, input and button.
//!
//! Peer text only ever reaches the page through `set_text_content` and text
//! nodes, so markup in a message renders literally.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement};

use crate::client::ChatView;
use crate::config::DomIds;
use crate::util::render::ChatLine;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("no window or document")]
    NoDocument,
    #[error("element #{0} not found")]
    Missing(String),
    #[error("element #{0} is not an input field")]
    NotInput(String),
}

pub struct DomView {
    document: Document,
    messages: Element,
    input: HtmlInputElement,
    send: Element,
}

impl DomView {
    /// Look up the three chat elements by id.
    pub fn bind(document: &Document, ids: &DomIds) -> Result<Self, DomError> {
        let find = |id: &str| document.get_element_by_id(id).ok_or_else(|| DomError::Missing(id.to_owned()));
        let messages = find(&ids.messages)?;
        let input = find(&ids.input)?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| DomError::NotInput(ids.input.clone()))?;
        let send = find(&ids.send)?;
        Ok(Self { document: document.clone(), messages, input, send })
    }

    pub fn input(&self) -> &HtmlInputElement {
        &self.input
    }

    pub fn send_button(&self) -> &Element {
        &self.send
    }

    /// `<p>[<time>ts</time> ]<strong>author:</strong> body</p>` as DOM nodes.
    fn build_line(&self, line: &ChatLine) -> Result<Element, JsValue> {
        let entry = self.document.create_element("p")?;
        if let Some(ts) = line.timestamp.as_deref() {
            let time = self.document.create_element("time")?;
            time.set_text_content(Some(ts));
            entry.append_child(&time)?;
            entry.append_child(&self.document.create_text_node(" "))?;
        }
        let author = self.document.create_element("strong")?;
        author.set_text_content(Some(&format!("{}:", line.author)));
        entry.append_child(&author)?;
        entry.append_child(&self.document.create_text_node(&format!(" {}", line.body)))?;
        Ok(entry)
    }

    fn push_line(&self, line: &ChatLine) {
        let appended = self.build_line(line).and_then(|entry| self.messages.append_child(&entry));
        if let Err(e) = appended {
            log::warn!("chat line not rendered: {e:?}");
        }
    }
}

impl ChatView for DomView {
    fn input_text(&self) -> String {
        self.input.value()
    }

    fn clear_input(&mut self) {
        self.input.set_value("");
    }

    fn append_line(&mut self, line: &ChatLine) {
        self.push_line(line);
    }

    fn remove_oldest(&mut self, count: usize) {
        for _ in 0..count {
            match self.messages.first_element_child() {
                Some(oldest) => oldest.remove(),
                None => break,
            }
        }
    }

    fn replace_lines(&mut self, lines: &[ChatLine]) {
        self.messages.set_text_content(None);
        for line in lines {
            self.push_line(line);
        }
    }

    fn scroll_to_latest(&mut self) {
        self.messages.set_scroll_top(self.messages.scroll_height());
    }
}
