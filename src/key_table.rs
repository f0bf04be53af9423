//! Shared field-name dictionaries.
//!
//! Records are addressed by field name, but the chunk format only knows numeric ids. A key table
//! assigns the ids, is written once as the reserved id-0 container at the start of the stream, and
//! is used to turn ids back into names on the way out.
//!
//! Ids live in two tiers. Every container name gets one id, shared by all containers with that
//! name anywhere in any record. Leaf names are scoped by the name of the container they sit in,
//! so `name` inside `site` and `name` inside `dish` get different ids. Top-level leaves are
//! scoped to the record itself. Both tiers draw from one counter, so an id never means two
//! things inside the same container.

use std::collections::BTreeMap;

use crate::decoder::{DecodeLimits, Decoder};
use crate::element::Element;
use crate::encoder::Encoder;
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::record::{Field, Record};
use crate::value::Value;
use crate::{FIRST_KEY_ID, KEY_TABLE_ID, RECORD_ID};

#[derive(Clone, Debug, Default, PartialEq)]
struct Scope {
    leaf_ids: BTreeMap<String, u64>,
    leaf_names: BTreeMap<u64, String>,
    /// Containers first seen inside this scope, in the order they were seen.
    children: Vec<String>,
}

/// A two-tier mapping between field names and chunk ids.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyTable {
    root: Scope,
    scopes: BTreeMap<String, Scope>,
    container_ids: BTreeMap<String, u64>,
    container_names: BTreeMap<u64, String>,
    next_id: u64,
}

impl Default for KeyTable {
    fn default() -> Self {
        Self {
            root: Scope::default(),
            scopes: BTreeMap::new(),
            container_ids: BTreeMap::new(),
            container_names: BTreeMap::new(),
            next_id: FIRST_KEY_ID,
        }
    }
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign ids to every field name used by `records`. Null fields don't get an id.
    pub fn build(records: &[Record]) -> KeyTable {
        let mut table = KeyTable::new();
        for record in records {
            table.collect_record(None, record);
        }
        table
    }

    /// Id of a container name.
    pub fn container_id(&self, name: &str) -> Option<u64> {
        self.container_ids.get(name).copied()
    }

    /// Id of a leaf name inside a container with the given name, or at the top level of a record
    /// if `parent` is `None`.
    pub fn leaf_id(&self, parent: Option<&str>, name: &str) -> Option<u64> {
        self.scope(parent)?.leaf_ids.get(name).copied()
    }

    pub fn container_name(&self, id: u64) -> Option<&str> {
        self.container_names.get(&id).map(String::as_str)
    }

    pub fn leaf_name(&self, parent: Option<&str>, id: u64) -> Option<&str> {
        self.scope(parent)?
            .leaf_names
            .get(&id)
            .map(String::as_str)
    }

    /// Total number of ids assigned, across both tiers.
    pub fn len(&self) -> usize {
        self.container_ids.len()
            + self.root.leaf_ids.len()
            + self.scopes.values().map(|s| s.leaf_ids.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the table as the reserved id-0 container.
    ///
    /// Leaf entries are string chunks holding the name under the leaf's id. Container entries
    /// are containers under the container's id, starting with a string chunk of id 0 holding the
    /// container name, followed by the entries scoped to that container. Each container name is
    /// written once, inside the scope where it was first seen.
    pub fn write(&self, enc: &mut Encoder) -> EncodeResult<()> {
        enc.enter_container(KEY_TABLE_ID)?;
        self.write_scope(enc, None)?;
        enc.leave_container()
    }

    /// Read the table from the next chunk of `dec`, which must be the reserved id-0 container.
    pub fn read(dec: &mut Decoder) -> DecodeResult<KeyTable> {
        match dec.next()? {
            Some(chunk) if chunk.id == KEY_TABLE_ID && chunk.is_container() => (),
            _ => return Err(DecodeError::MissingKeyTable),
        }
        dec.enter_container()?;
        let mut table = KeyTable::new();
        table.read_scope(dec, None)?;
        dec.leave_container()?;
        Ok(table)
    }

    /// Encode records against this table, without writing the table itself.
    pub fn write_records(&self, enc: &mut Encoder, records: &[Record]) -> EncodeResult<()> {
        for record in records {
            enc.enter_container(RECORD_ID)?;
            self.write_record(enc, None, record)?;
            enc.leave_container()?;
        }
        Ok(())
    }

    /// Decode every remaining record chunk in `dec` against this table.
    pub fn read_records(&self, dec: &mut Decoder) -> DecodeResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(chunk) = dec.next()? {
            if chunk.id != RECORD_ID || !chunk.is_container() {
                return Err(DecodeError::UnexpectedRecordChunk { id: chunk.id });
            }
            dec.enter_container()?;
            records.push(self.read_record(dec, None)?);
            dec.leave_container()?;
        }
        Ok(records)
    }

    fn scope(&self, parent: Option<&str>) -> Option<&Scope> {
        match parent {
            None => Some(&self.root),
            Some(name) => self.scopes.get(name),
        }
    }

    fn scope_mut(&mut self, parent: Option<&str>) -> &mut Scope {
        match parent {
            None => &mut self.root,
            Some(name) => self.scopes.entry(name.to_owned()).or_default(),
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn collect_record(&mut self, parent: Option<&str>, record: &Record) {
        for (name, field) in record.iter() {
            self.collect_field(parent, name, field);
        }
    }

    fn collect_field(&mut self, parent: Option<&str>, name: &str, field: &Field) {
        match field {
            Field::Null => (),
            Field::Value(_) => {
                if self.leaf_id(parent, name).is_none() {
                    let id = self.take_id();
                    let scope = self.scope_mut(parent);
                    scope.leaf_ids.insert(name.to_owned(), id);
                    scope.leaf_names.insert(id, name.to_owned());
                }
            }
            Field::Record(record) => {
                if self.container_id(name).is_none() {
                    let id = self.take_id();
                    self.container_ids.insert(name.to_owned(), id);
                    self.container_names.insert(id, name.to_owned());
                    self.scope_mut(parent).children.push(name.to_owned());
                }
                self.collect_record(Some(name), record);
            }
            Field::List(items) => {
                for item in items {
                    self.collect_field(parent, name, item);
                }
            }
        }
    }

    fn write_scope(&self, enc: &mut Encoder, parent: Option<&str>) -> EncodeResult<()> {
        let scope = match self.scope(parent) {
            Some(scope) => scope,
            None => return Ok(()),
        };
        for (&id, name) in &scope.leaf_names {
            enc.write_str(id, name)?;
        }
        for child in &scope.children {
            let id = self.container_id(child).ok_or_else(|| EncodeError::MissingKey {
                parent: parent.map(str::to_owned),
                name: child.clone(),
            })?;
            enc.enter_container(id)?;
            enc.write_str(KEY_TABLE_ID, child)?;
            self.write_scope(enc, Some(child.as_str()))?;
            enc.leave_container()?;
        }
        Ok(())
    }

    fn read_scope(&mut self, dec: &mut Decoder, parent: Option<&str>) -> DecodeResult<()> {
        while let Some(chunk) = dec.next()? {
            if chunk.id < FIRST_KEY_ID {
                return Err(DecodeError::MalformedKeyTable(format!(
                    "entry uses reserved id {}",
                    chunk.id
                )));
            }
            match chunk.element {
                Element::Str(name) => {
                    let scope = self.scope_mut(parent);
                    if scope.leaf_names.contains_key(&chunk.id) || scope.leaf_ids.contains_key(name)
                    {
                        return Err(DecodeError::MalformedKeyTable(format!(
                            "leaf {:?} (id {}) is listed twice",
                            name, chunk.id
                        )));
                    }
                    scope.leaf_ids.insert(name.to_owned(), chunk.id);
                    scope.leaf_names.insert(chunk.id, name.to_owned());
                }
                Element::Container(_) => {
                    dec.enter_container()?;
                    let name = match dec.next()? {
                        Some(first) if first.id == KEY_TABLE_ID => match first.element {
                            Element::Str(name) => name.to_owned(),
                            _ => {
                                return Err(DecodeError::MalformedKeyTable(
                                    "container name is not a string".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(DecodeError::MalformedKeyTable(format!(
                                "container entry {} has no name",
                                chunk.id
                            )))
                        }
                    };
                    if self.container_names.contains_key(&chunk.id)
                        || self.container_ids.contains_key(&name)
                    {
                        return Err(DecodeError::MalformedKeyTable(format!(
                            "container {:?} (id {}) is listed twice",
                            name, chunk.id
                        )));
                    }
                    self.container_ids.insert(name.clone(), chunk.id);
                    self.container_names.insert(chunk.id, name.clone());
                    self.scope_mut(parent).children.push(name.clone());
                    self.read_scope(dec, Some(name.as_str()))?;
                    dec.leave_container()?;
                }
                ref other => {
                    return Err(DecodeError::MalformedKeyTable(format!(
                        "unexpected {} entry with id {}",
                        other.name(),
                        chunk.id
                    )))
                }
            }
            self.next_id = self.next_id.max(chunk.id + 1);
        }
        Ok(())
    }

    fn write_record(
        &self,
        enc: &mut Encoder,
        parent: Option<&str>,
        record: &Record,
    ) -> EncodeResult<()> {
        for (name, field) in record.iter() {
            self.write_field(enc, parent, name, field, false)?;
        }
        Ok(())
    }

    fn write_field(
        &self,
        enc: &mut Encoder,
        parent: Option<&str>,
        name: &str,
        field: &Field,
        in_list: bool,
    ) -> EncodeResult<()> {
        let missing = || EncodeError::MissingKey {
            parent: parent.map(str::to_owned),
            name: name.to_owned(),
        };
        match field {
            Field::Null => Ok(()),
            Field::Value(Value::Container(_)) => {
                Err(EncodeError::UnsupportedValueType("Container"))
            }
            Field::Value(value) => {
                let id = self.leaf_id(parent, name).ok_or_else(missing)?;
                enc.write(id, value)
            }
            Field::Record(record) => {
                let id = self.container_id(name).ok_or_else(missing)?;
                enc.enter_container(id)?;
                self.write_record(enc, Some(name), record)?;
                enc.leave_container()
            }
            Field::List(_) if in_list => Err(EncodeError::UnsupportedValueType("List")),
            Field::List(items) => {
                for item in items {
                    self.write_field(enc, parent, name, item, true)?;
                }
                Ok(())
            }
        }
    }

    fn read_record(&self, dec: &mut Decoder, parent: Option<&str>) -> DecodeResult<Record> {
        let unresolved = |id: u64| DecodeError::UnresolvedKeyId {
            id,
            parent: parent.map(str::to_owned),
        };
        let mut record = Record::new();
        while let Some(chunk) = dec.next()? {
            match chunk.element.to_value() {
                Some(value) => {
                    let name = self
                        .leaf_name(parent, chunk.id)
                        .ok_or_else(|| unresolved(chunk.id))?;
                    record.accumulate(name.to_owned(), Field::Value(value));
                }
                None => {
                    let name = self
                        .container_name(chunk.id)
                        .ok_or_else(|| unresolved(chunk.id))?;
                    dec.enter_container()?;
                    let child = self.read_record(dec, Some(name))?;
                    dec.leave_container()?;
                    record.accumulate(name.to_owned(), Field::Record(child));
                }
            }
        }
        Ok(record)
    }
}

/// Encode records behind a freshly built key table.
pub fn encode_with_key_table(records: &[Record]) -> EncodeResult<Vec<u8>> {
    let _span = tracing::debug_span!("encode_with_key_table", records = records.len()).entered();
    let table = KeyTable::build(records);
    let mut enc = Encoder::new();
    table.write(&mut enc)?;
    table.write_records(&mut enc, records)?;
    let out = enc.finish()?;
    tracing::debug!(
        records = records.len(),
        keys = table.len(),
        bytes = out.len(),
        "encoded records with key table"
    );
    Ok(out)
}

/// Encode a single record behind a freshly built key table.
pub fn encode_record_with_key_table(record: &Record) -> EncodeResult<Vec<u8>> {
    encode_with_key_table(std::slice::from_ref(record))
}

pub fn decode_with_key_table(data: &[u8]) -> DecodeResult<Vec<Record>> {
    decode_with_key_table_limits(data, DecodeLimits::default())
}

/// Decode a key table stream into its records, resolving every id through the table.
pub fn decode_with_key_table_limits(
    data: &[u8],
    limits: DecodeLimits,
) -> DecodeResult<Vec<Record>> {
    let _span = tracing::debug_span!("decode_with_key_table", bytes = data.len()).entered();
    let mut dec = Decoder::with_limits(data, limits);
    let table = KeyTable::read(&mut dec)?;
    let records = table.read_records(&mut dec)?;
    tracing::debug!(
        records = records.len(),
        keys = table.len(),
        "decoded records with key table"
    );
    Ok(records)
}

/// Decode a key table stream that must hold exactly one record.
pub fn decode_record_with_key_table(data: &[u8]) -> DecodeResult<Record> {
    let mut records = decode_with_key_table(data)?;
    if records.len() != 1 {
        return Err(DecodeError::RecordCount {
            expected: 1,
            actual: records.len(),
        });
    }
    Ok(records.remove(0))
}
