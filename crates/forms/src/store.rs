//! Minimal owner of live records.

use std::collections::BTreeMap;

use bytes::Bytes;
use formext_codec::{RecordReader, RecordWriter};
use formext_primitives::{FormFlags, FormId, TypeCode};

use crate::PartialRecordPolicy;
use crate::error::StoreError;
use crate::lifecycle::Lifecycle;
use crate::record::ExtendedRecord;

/// First id handed out; lower ids belong to the host.
const FIRST_FORM_ID: u32 = 0x0000_0800;

pub struct FormStore<'l> {
	lifecycle: &'l Lifecycle,
	policy: PartialRecordPolicy,
	records: BTreeMap<FormId, Box<dyn ExtendedRecord>>,
	/// `None` once `u32::MAX` has been handed out.
	next_id: Option<u32>,
}

impl<'l> FormStore<'l> {
	pub fn new(lifecycle: &'l Lifecycle, policy: PartialRecordPolicy) -> Self {
		Self {
			lifecycle,
			policy,
			records: BTreeMap::new(),
			next_id: Some(FIRST_FORM_ID),
		}
	}

	pub fn policy(&self) -> PartialRecordPolicy {
		self.policy
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn get(&self, id: FormId) -> Option<&dyn ExtendedRecord> {
		self.records.get(&id).map(|r| &**r)
	}

	pub fn get_mut(&mut self, id: FormId) -> Option<&mut dyn ExtendedRecord> {
		self.records.get_mut(&id).map(|r| &mut **r)
	}

	pub fn iter(&self) -> impl Iterator<Item = (FormId, &dyn ExtendedRecord)> {
		self.records.iter().map(|(&id, r)| (id, &**r))
	}

	fn allocate_id(&mut self) -> Result<FormId, StoreError> {
		let id = self.next_id.ok_or(StoreError::IdsExhausted)?;
		self.next_id = id.checked_add(1);
		Ok(FormId(id))
	}

	/// Inserts `record`, assigning a form id if it has none.
	///
	/// A record already carrying an id replaces any record stored under it.
	pub fn insert(&mut self, mut record: Box<dyn ExtendedRecord>) -> Result<FormId, StoreError> {
		let id = record.form().form_id;
		let id = if id.is_none() {
			let id = self.allocate_id()?;
			record.form_mut().form_id = id;
			id
		} else {
			if self.next_id.is_some_and(|next| id.0 >= next) {
				self.next_id = id.0.checked_add(1);
			}
			id
		};
		if self.records.insert(id, record).is_some() {
			tracing::debug!(form_id = %id, "replaced record");
		}
		Ok(id)
	}

	/// Creates and inserts a default record of `code`.
	pub fn create(&mut self, code: TypeCode) -> Result<FormId, StoreError> {
		let record = self.lifecycle.create(code)?;
		self.insert(record)
	}

	/// Decodes one record of `code` and inserts it.
	///
	/// A malformed stream drops the record under
	/// [`PartialRecordPolicy::Discard`] and keeps whatever decoded under
	/// [`PartialRecordPolicy::Keep`].
	pub fn load(&mut self, code: TypeCode, bytes: impl Into<Bytes>) -> Result<FormId, StoreError> {
		let mut record = self.lifecycle.create(code)?;
		let mut reader = RecordReader::new(bytes);
		match record.load(&mut reader) {
			Ok(report) => {
				for chunk in &report.unrecognized {
					tracing::debug!(%chunk, "record kept despite unrecognized chunk");
				}
			}
			Err(source) => match self.policy {
				PartialRecordPolicy::Discard => {
					tracing::warn!(code = %code, error = %source, "discarding malformed record");
					return Err(StoreError::Discarded { code, source });
				}
				PartialRecordPolicy::Keep => {
					tracing::warn!(code = %code, error = %source, "keeping partially decoded record");
				}
			},
		}
		self.insert(record)
	}

	/// Encodes the record `id` as one chunk stream.
	pub fn save(&self, id: FormId) -> Result<Bytes, StoreError> {
		let record = self.get(id).ok_or(StoreError::NotFound(id))?;
		let mut writer = RecordWriter::new();
		record.save(&mut writer)?;
		Ok(writer.into_bytes())
	}

	fn blank_copy_of(&self, id: FormId) -> Result<(&dyn ExtendedRecord, Box<dyn ExtendedRecord>), StoreError> {
		let source = self.get(id).ok_or(StoreError::NotFound(id))?;
		let copy = self.lifecycle.create(source.type_code())?;
		Ok((source, copy))
	}

	/// Inserts a persistent copy of `id` under a fresh form id.
	///
	/// The editor id is not carried over.
	pub fn duplicate(&mut self, id: FormId) -> Result<FormId, StoreError> {
		let (source, mut copy) = self.blank_copy_of(id)?;
		copy.copy_from(source);
		self.insert(copy)
	}

	/// Returns a temporary copy of `id` sharing its identity, for editing
	/// outside the store. Apply it back with [`FormStore::apply`].
	pub fn temporary_copy(&self, id: FormId) -> Result<Box<dyn ExtendedRecord>, StoreError> {
		let (source, mut copy) = self.blank_copy_of(id)?;
		copy.form_mut().flags.insert(FormFlags::TEMPORARY);
		copy.copy_from(source);
		Ok(copy)
	}

	/// Copies an edited temporary record onto the stored record it was made
	/// from. Returns whether anything changed.
	pub fn apply(&mut self, temporary: &dyn ExtendedRecord) -> Result<bool, StoreError> {
		let id = temporary.form().form_id;
		if !temporary.form().is_temporary() {
			return Err(StoreError::NotTemporary(id));
		}
		let target = self.get_mut(id).ok_or(StoreError::NotFound(id))?;
		let renamed = target.form().editor_id() != temporary.form().editor_id();
		let changed = target.compare_to(temporary);
		if changed {
			target.copy_from(temporary);
		}
		if renamed {
			let editor_id = temporary.form().editor_id().unwrap_or_default();
			target.form_mut().set_editor_id(editor_id);
		}
		Ok(changed || renamed)
	}

	pub fn remove(&mut self, id: FormId) -> Option<Box<dyn ExtendedRecord>> {
		self.records.remove(&id)
	}
}

impl std::fmt::Debug for FormStore<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormStore")
			.field("policy", &self.policy)
			.field("records", &self.records.len())
			.field("next_id", &self.next_id.map(FormId))
			.finish()
	}
}
