//! Synthetic document backend and terminal helpers for tests

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::pdf::{DocumentBackend, LoadError, PageData, PageHandle, RasterSurface, RenderError};

/// Describes a fake document; [`to_bytes`](Self::to_bytes) gives what to
/// hand to `open_document`.
///
/// Serialized as a single line, e.g.
/// `FAKEPDF pages=3 size=612x792 fail=2 slow=1:200`.
#[derive(Clone, Debug)]
pub struct FakePdf {
    pub pages: usize,
    pub width_pt: f32,
    pub height_pt: f32,
    pub failing: Vec<usize>,
    pub slow: Vec<(usize, u64)>,
}

impl FakePdf {
    /// US letter pages
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            width_pt: 612.0,
            height_pt: 792.0,
            failing: vec![],
            slow: vec![],
        }
    }

    pub fn size(mut self, width_pt: f32, height_pt: f32) -> Self {
        self.width_pt = width_pt;
        self.height_pt = height_pt;
        self
    }

    /// Rendering `page_number` fails
    pub fn failing(mut self, page_number: usize) -> Self {
        self.failing.push(page_number);
        self
    }

    /// Rendering `page_number` takes `millis`
    pub fn slow(mut self, page_number: usize, millis: u64) -> Self {
        self.slow.push((page_number, millis));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut line = format!(
            "FAKEPDF pages={} size={}x{}",
            self.pages, self.width_pt, self.height_pt
        );
        if !self.failing.is_empty() {
            let pages: Vec<String> = self.failing.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" fail={}", pages.join(",")));
        }
        if !self.slow.is_empty() {
            let pages: Vec<String> = self
                .slow
                .iter()
                .map(|(page, millis)| format!("{page}:{millis}"))
                .collect();
            line.push_str(&format!(" slow={}", pages.join(",")));
        }
        line.into_bytes()
    }
}

/// Document as seen by one worker
#[derive(Debug)]
pub struct FakeDocument {
    pages: usize,
    width_pt: f32,
    height_pt: f32,
    failing: Vec<usize>,
    slow: HashMap<usize, Duration>,
}

impl FakeDocument {
    fn parse(content: &str) -> Result<Self, LoadError> {
        let mut words = content.split_whitespace();
        if words.next() != Some("FAKEPDF") {
            return Err(LoadError::unreadable("not a fake PDF"));
        }

        let spec = FakePdf::new(1);
        let mut doc = Self {
            pages: spec.pages,
            width_pt: spec.width_pt,
            height_pt: spec.height_pt,
            failing: vec![],
            slow: HashMap::new(),
        };

        for word in words {
            let (key, value) = word
                .split_once('=')
                .ok_or_else(|| LoadError::unreadable(format!("bad field {word}")))?;
            match key {
                "pages" => doc.pages = parse_number(value)?,
                "size" => {
                    let (w, h) = value
                        .split_once('x')
                        .ok_or_else(|| LoadError::unreadable("bad size"))?;
                    doc.width_pt = parse_number(w)?;
                    doc.height_pt = parse_number(h)?;
                }
                "fail" => {
                    for page in value.split(',') {
                        doc.failing.push(parse_number(page)?);
                    }
                }
                "slow" => {
                    for entry in value.split(',') {
                        let (page, millis) = entry
                            .split_once(':')
                            .ok_or_else(|| LoadError::unreadable("bad slow entry"))?;
                        doc.slow.insert(
                            parse_number(page)?,
                            Duration::from_millis(parse_number(millis)?),
                        );
                    }
                }
                _ => return Err(LoadError::unreadable(format!("unknown field {key}"))),
            }
        }
        Ok(doc)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, LoadError> {
    value
        .parse()
        .map_err(|_| LoadError::unreadable(format!("bad number {value}")))
}

/// Backend that "renders" blank pages from a [`FakePdf`] description
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeBackend;

impl DocumentBackend for FakeBackend {
    type Document = FakeDocument;

    fn open(&self, path: &Path) -> Result<FakeDocument, LoadError> {
        let content = fs::read_to_string(path)
            .map_err(|_| LoadError::unreadable("document is not readable"))?;
        FakeDocument::parse(&content)
    }

    fn page_count(&self, doc: &FakeDocument) -> Result<usize, LoadError> {
        Ok(doc.pages)
    }

    fn render_page(
        &self,
        doc: &FakeDocument,
        page_number: usize,
        scale: f32,
    ) -> Result<PageData, RenderError> {
        if let Some(delay) = doc.slow.get(&page_number) {
            std::thread::sleep(*delay);
        }
        if page_number == 0 || page_number > doc.pages {
            return Err(RenderError::PageOutOfRange {
                page_number,
                page_count: doc.pages,
            });
        }
        if doc.failing.contains(&page_number) {
            return Err(RenderError::generic(format!(
                "page {page_number} is damaged"
            )));
        }

        let handle = PageHandle {
            page_number,
            width_pt: doc.width_pt,
            height_pt: doc.height_pt,
        };
        let viewport = handle.viewport_at(scale);
        Ok(PageData {
            viewport,
            handle,
            surface: RasterSurface::filled(viewport.width_px, viewport.height_px, [255; 3]),
        })
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for scripted terminal input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::code_key(code));
            self
        }

        /// Press `n` the given number of times
        pub fn next_match(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('n'));
            }
            self
        }

        /// Press `j` the given number of times
        pub fn next_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::left_click(column, row));
            self
        }

        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        pub fn len(&self) -> usize {
            self.events.len()
        }

        pub fn is_empty(&self) -> bool {
            self.events.is_empty()
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Terminal buffer as text, trailing blanks trimmed
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn fake_pdf_description_parses_back() {
        let bytes = FakePdf::new(3)
            .size(100.0, 200.0)
            .failing(2)
            .slow(1, 20)
            .to_bytes();
        let doc = FakeDocument::parse(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(doc.pages, 3);
        assert_eq!((doc.width_pt, doc.height_pt), (100.0, 200.0));
        assert_eq!(doc.failing, vec![2]);
        assert_eq!(doc.slow.get(&1), Some(&Duration::from_millis(20)));
    }

    #[test]
    fn garbage_is_unreadable() {
        assert!(matches!(
            FakeDocument::parse("%PDF-1.7 garbage"),
            Err(LoadError::Unreadable { .. })
        ));
    }

    #[test]
    fn failing_page_errors() {
        let doc = FakeDocument::parse("FAKEPDF pages=2 fail=2").unwrap();
        assert!(FakeBackend.render_page(&doc, 1, 1.5).is_ok());
        assert!(FakeBackend.render_page(&doc, 2, 1.5).is_err());
        assert!(FakeBackend.render_page(&doc, 3, 1.5).is_err());
    }

    #[test]
    fn scenario_builder_collects_events() {
        let scenario = TestScenarioBuilder::new()
            .next_match(2)
            .next_page(1)
            .click(1, 1)
            .quit();
        assert_eq!(scenario.len(), 5);
        assert_eq!(scenario.build().remaining(), 5);
    }
}
