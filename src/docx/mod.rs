/*!
 * WordprocessingML (DOCX) support.
 *
 * - `xml`: owned XML tree used to read and edit package parts
 * - `package`: the zip container and its parts
 * - `reader`: body blocks in document order
 * - `builder`: writing new documents with docx-rs
 */

pub mod builder;
pub mod package;
pub mod reader;
pub mod xml;

pub use self::builder::{Align, Borders, Cell, DocxBuilder, Para, Row, Run, RunStyle, TableSpec, VMerge};
pub use self::package::DocxPackage;
pub use self::reader::{Block, Paragraph, StyleMap, Table, read_body, read_blocks};
pub use self::xml::{Element, XmlDocument};
