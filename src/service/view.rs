//! List view over a fetched collection: search, pagination and the table
//! projection. No I/O.

use crate::config::ResourceConfig;
use crate::record::{FieldValue, Record};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const EMPTY_MESSAGE: &str = "No se encontraron registros";

#[derive(Clone, Debug)]
pub struct ListView {
    items: Vec<Record>,
    search: String,
    page: usize,
    page_size: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        ListView {
            items: Vec::new(),
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_items(&mut self, items: Vec<Record>) {
        self.items = items;
        self.page = self.page.clamp(1, self.last_page());
    }

    pub fn clear(&mut self) {
        self.set_items(Vec::new());
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    /// Change the search term; a different term goes back to page 1.
    pub fn search(&mut self, term: &str) -> Vec<&Record> {
        if term != self.search {
            self.search = term.to_string();
            self.page = 1;
        }
        self.filtered()
    }

    /// Records with any scalar value containing the term, case-insensitively.
    /// An empty term matches everything.
    pub fn filtered(&self) -> Vec<&Record> {
        if self.search.is_empty() {
            return self.items.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.items.iter().filter(|r| r.matches(&needle)).collect()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    /// Set the page size and return `(page, total_pages)`. Page is clamped
    /// into range.
    pub fn paginate(&mut self, page_size: usize) -> (usize, usize) {
        self.page_size = page_size.max(1);
        self.page = self.page.clamp(1, self.last_page());
        (self.page, self.total_pages())
    }

    pub fn go_to(&mut self, page: usize) -> usize {
        self.page = page.clamp(1, self.last_page());
        self.page
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.page + 1)
    }

    pub fn prev(&mut self) -> usize {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Records on `page` (1-based) of the filtered set.
    pub fn page_items(&self, page: usize) -> Vec<&Record> {
        let start = page.saturating_sub(1) * self.page_size;
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn current_items(&self) -> Vec<&Record> {
        self.page_items(self.page)
    }

    pub fn summary(&self) -> String {
        format!(
            "Mostrando {} de {} registros",
            self.current_items().len(),
            self.filtered().len()
        )
    }

    pub fn page_label(&self) -> String {
        format!("Página {} de {}", self.page, self.total_pages())
    }

    /// Project the current page onto the configured display columns.
    pub fn table(&self, config: &ResourceConfig) -> TableModel {
        let mut headers = vec!["ID".to_string()];
        headers.extend(config.display_fields.iter().map(|f| config.label_for(f).to_string()));
        headers.push("Acciones".to_string());

        let rows: Vec<TableRow> = self
            .current_items()
            .into_iter()
            .enumerate()
            .map(|(idx, record)| TableRow {
                id: record
                    .get(&config.id_field)
                    .and_then(FieldValue::as_path_segment)
                    .unwrap_or_else(|| (idx + 1).to_string()),
                cells: config
                    .display_fields
                    .iter()
                    .map(|f| display_value(record.get(f)))
                    .collect(),
            })
            .collect();

        let empty_message = rows.is_empty().then(|| EMPTY_MESSAGE.to_string());
        let pagination = (self.total_pages() > 1).then(|| self.page_label());
        TableModel {
            headers,
            rows,
            empty_message,
            summary: self.summary(),
            pagination,
        }
    }
}

/// Cell text: `Sí`/`No` for booleans, the value for text and numbers, `-`
/// for anything missing or non-scalar.
pub fn display_value(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Bool(true)) => "Sí".into(),
        Some(FieldValue::Bool(false)) => "No".into(),
        Some(v @ (FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Text(_))) => v.to_string(),
        _ => "-".into(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Set when there are no rows to show.
    pub empty_message: Option<String>,
    pub summary: String,
    /// Set only when there is more than one page.
    pub pagination: Option<String>,
}

impl TableModel {
    /// Plain-text rendering with padded columns; the actions column is left out.
    pub fn render_text(&self) -> String {
        let cols = self.headers.len().saturating_sub(1);
        let mut widths: Vec<usize> = self.headers[..cols].iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            let cells = std::iter::once(&row.id).chain(row.cells.iter());
            for (w, cell) in widths.iter_mut().zip(cells) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&line(self.headers[..cols].iter().map(String::as_str).collect()));
        out.push('\n');
        match &self.empty_message {
            Some(msg) => {
                out.push_str(msg);
                out.push('\n');
            }
            None => {
                for row in &self.rows {
                    let cells = std::iter::once(row.id.as_str())
                        .chain(row.cells.iter().map(String::as_str))
                        .collect();
                    out.push_str(&line(cells));
                    out.push('\n');
                }
            }
        }
        out.push_str(&self.summary);
        if let Some(p) = &self.pagination {
            out.push('\n');
            out.push_str(p);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: i64, nombre: &str) -> Record {
        Record::from_json(json!({"id": id, "nombre": nombre, "descripcion": format!("Description {}", id)}))
            .unwrap()
    }

    fn view_with(n: i64, page_size: usize) -> ListView {
        let mut v = ListView::new(page_size);
        v.set_items((1..=n).map(|i| record(i, &format!("Test Item {}", i))).collect());
        v
    }

    fn config() -> ResourceConfig {
        ResourceConfig {
            title: "Test Items".into(),
            endpoint: "/test-items".into(),
            fields: vec![
                FieldDescriptor::text("nombre", "Nombre").required(),
                FieldDescriptor::text("descripcion", "Descripción"),
            ],
            display_fields: vec!["nombre".into(), "descripcion".into(), "activo".into()],
            id_field: "id".into(),
        }
    }

    #[test]
    fn search_matches_one_item() {
        let mut v = view_with(2, 10);
        let hits = v.search("Item 1");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("id"), Some(&FieldValue::Int(1)));
    }

    #[test]
    fn search_is_case_insensitive_and_idempotent() {
        let mut v = view_with(12, 10);
        let once: Vec<Record> = v.search("item 1").into_iter().cloned().collect();
        let twice: Vec<Record> = v.search("item 1").into_iter().cloned().collect();
        assert_eq!(once, twice);
        // 1, 10, 11, 12
        assert_eq!(once.len(), 4);
        assert_eq!(v.search("").len(), 12);
    }

    #[test]
    fn search_covers_numbers_too() {
        let mut v = view_with(3, 10);
        assert_eq!(v.search("3").len(), 1);
    }

    #[test]
    fn changing_search_resets_to_first_page() {
        let mut v = view_with(25, 10);
        v.go_to(3);
        assert_eq!(v.page(), 3);
        v.search("Test");
        assert_eq!(v.page(), 1);
    }

    #[test]
    fn pages_partition_the_filtered_set() {
        for n in [0i64, 1, 9, 10, 11, 25, 30] {
            for p in [1usize, 3, 10] {
                let mut v = view_with(n, p);
                let (_, total) = v.paginate(p);
                assert_eq!(total, (n as usize).div_ceil(p));
                let joined: Vec<&Record> = (1..=total).flat_map(|page| v.page_items(page)).collect();
                assert_eq!(joined, v.filtered());
            }
        }
    }

    #[test]
    fn page_clamps_into_range() {
        let mut v = view_with(25, 10);
        assert_eq!(v.go_to(99), 3);
        assert_eq!(v.next(), 3);
        assert_eq!(v.go_to(0), 1);
        assert_eq!(v.prev(), 1);
        let mut empty = ListView::default();
        assert_eq!(empty.go_to(5), 1);
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn shrinking_collection_pulls_page_back() {
        let mut v = view_with(25, 10);
        v.go_to(3);
        v.set_items(vec![record(1, "solo")]);
        assert_eq!(v.page(), 1);
    }

    #[test]
    fn table_projects_display_fields() {
        let mut v = view_with(1, 10);
        let mut items = v.items().to_vec();
        items[0].insert("activo", true);
        v.set_items(items);
        let t = v.table(&config());
        assert_eq!(t.headers, vec!["ID", "Nombre", "Descripción", "activo", "Acciones"]);
        assert_eq!(
            t.rows,
            vec![TableRow {
                id: "1".into(),
                cells: vec!["Test Item 1".into(), "Description 1".into(), "Sí".into()],
            }]
        );
        assert_eq!(t.summary, "Mostrando 1 de 1 registros");
        assert!(t.empty_message.is_none());
        assert!(t.pagination.is_none());
    }

    #[test]
    fn empty_table_has_empty_state() {
        let v = ListView::default();
        let t = v.table(&config());
        assert!(t.rows.is_empty());
        assert_eq!(t.empty_message.as_deref(), Some(EMPTY_MESSAGE));
        assert!(t.render_text().contains(EMPTY_MESSAGE));
    }

    #[test]
    fn missing_id_falls_back_to_row_number() {
        let mut v = ListView::default();
        v.set_items(vec![Record::from_json(json!({"nombre": "x"})).unwrap()]);
        let t = v.table(&config());
        assert_eq!(t.rows[0].id, "1");
        assert_eq!(t.rows[0].cells, vec!["x", "-", "-"]);
    }

    #[test]
    fn pagination_label_only_with_several_pages() {
        let v = view_with(11, 10);
        assert_eq!(v.table(&config()).pagination.as_deref(), Some("Página 1 de 2"));
    }
}
