use crate::error::{Result, Witsml2CsvError};
use crate::witsml::header::MnemonicMap;
use roxmltree::{Document, Node, ParsingOptions};

pub const MNEMONIC_LIST: &str = "mnemonicList";
pub const UNIT_LIST: &str = "unitList";
pub const LOG_NAME: &str = "name";
pub const DATA_ROW: &str = "data";

/// The parts of a WITSML log document the converter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDocument {
    pub mnemonics: MnemonicMap,
    /// Number of entries in `mnemonicList`, before pairing with units and
    /// merging duplicates.
    pub declared_width: usize,
    pub name: String,
    /// Raw text of every `data` element, in document order.
    pub rows: Vec<String>,
}

impl LogDocument {
    /// Parses the document and pulls out the first header lists, the first
    /// `name` and all `data` rows.
    ///
    /// Elements are matched on their local name, so `witsml:data` and `data`
    /// are treated alike.
    pub fn parse(xml_text: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(xml_text, options)?;

        let mnemonic_list = first_element(&doc, MNEMONIC_LIST).ok_or(
            Witsml2CsvError::MissingElement {
                element: MNEMONIC_LIST,
            },
        )?;
        let unit_list = first_element(&doc, UNIT_LIST)
            .ok_or(Witsml2CsvError::MissingElement { element: UNIT_LIST })?;
        let mnemonic_text = element_text(mnemonic_list);
        let declared_width = mnemonic_text.split(',').count();
        let mnemonics = MnemonicMap::from_lists(&mnemonic_text, &element_text(unit_list));

        let name = first_element(&doc, LOG_NAME)
            .map(element_text)
            .ok_or(Witsml2CsvError::MissingElement { element: LOG_NAME })?;

        let rows: Vec<String> = doc
            .descendants()
            .filter(|n| is_named(n, DATA_ROW))
            .map(element_text)
            .collect();

        tracing::debug!(
            name = %name,
            mnemonics = mnemonics.len(),
            rows = rows.len(),
            "parsed log document"
        );

        Ok(Self {
            mnemonics,
            declared_width,
            name,
            rows,
        })
    }
}

fn is_named(node: &Node, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

fn first_element<'a, 'input>(
    doc: &'a Document<'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| is_named(n, local_name))
}

// Concatenation of every text node below the element, CDATA included.
fn element_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
