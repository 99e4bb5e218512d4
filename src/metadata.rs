//! Document metadata.
//!
//! The metadata is written into the document information dictionary as soon as
//! the first page is started. For PDF/A output, the same data is additionally
//! written as an XMP metadata stream that is attached to the catalog.

use crate::primitive::{Dict, Object};
use std::fmt::Write as _;
use xmp_writer::{Timezone, XmpWriter};

/// The producer that is recorded when none is set explicitly.
const DEFAULT_PRODUCER: &str = "folio";

/// Metadata for a PDF document.
#[derive(Default, Clone, Debug, Hash)]
pub struct Metadata {
    pub(crate) title: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) creator: Option<String>,
    pub(crate) producer: Option<String>,
    pub(crate) keywords: Option<Vec<String>>,
    pub(crate) authors: Option<Vec<String>>,
    pub(crate) creation_date: Option<DateTime>,
    pub(crate) modification_date: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// The title of the document.
    pub fn title(mut self, title: String) -> Self {
        if !title.is_empty() {
            self.title = Some(title);
        }
        self
    }

    /// The subject of the document.
    pub fn subject(mut self, subject: String) -> Self {
        if !subject.is_empty() {
            self.subject = Some(subject);
        }
        self
    }

    /// The keywords that describe the document.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.keywords = Some(keywords);
        }
        self
    }

    /// The tool that created the original document.
    pub fn creator(mut self, creator: String) -> Self {
        if !creator.is_empty() {
            self.creator = Some(creator);
        }
        self
    }

    /// The tool that converted the document to PDF.
    pub fn producer(mut self, producer: String) -> Self {
        if !producer.is_empty() {
            self.producer = Some(producer);
        }
        self
    }

    /// The authors of the document.
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        if !authors.is_empty() {
            self.authors = Some(authors);
        }
        self
    }

    /// The creation date of the document.
    pub fn creation_date(mut self, creation_date: DateTime) -> Self {
        self.creation_date = Some(creation_date);
        self
    }

    /// The date of the last modification of the document.
    pub fn modification_date(mut self, modification_date: DateTime) -> Self {
        self.modification_date = Some(modification_date);
        self
    }

    fn producer_or_default(&self) -> &str {
        self.producer.as_deref().unwrap_or(DEFAULT_PRODUCER)
    }

    pub(crate) fn document_info(&self) -> Dict {
        let mut info = Dict::new();

        if let Some(title) = &self.title {
            info.insert("Title", Object::text(title));
        }

        if let Some(authors) = &self.authors {
            info.insert("Author", Object::text(&authors.join(", ")));
        }

        if let Some(subject) = &self.subject {
            info.insert("Subject", Object::text(subject));
        }

        if let Some(keywords) = &self.keywords {
            info.insert("Keywords", Object::text(&keywords.join(", ")));
        }

        if let Some(creator) = &self.creator {
            info.insert("Creator", Object::text(creator));
        }

        info.insert("Producer", Object::text(self.producer_or_default()));

        if let Some(date) = self.creation_date {
            info.insert("CreationDate", Object::String(pdf_date(date).into_bytes()));
        }

        if let Some(date) = self.modification_date.or(self.creation_date) {
            info.insert("ModDate", Object::String(pdf_date(date).into_bytes()));
        }

        info
    }

    pub(crate) fn xmp_metadata(&self, document_id: &str, instance_id: &str) -> String {
        let mut xmp = XmpWriter::new();

        if let Some(title) = &self.title {
            xmp.title([(None, title.as_str())]);
        }

        if let Some(subject) = &self.subject {
            xmp.description([(None, subject.as_str())]);
        }

        if let Some(keywords) = &self.keywords {
            let joined = keywords.join(", ");
            xmp.pdf_keywords(joined.as_str());
        }

        if let Some(authors) = &self.authors {
            // The information dictionary holds a single author string, so the
            // XMP array holds the same joined string.
            let joined = authors.join(", ");
            xmp.creator([joined.as_str()]);
        }

        if let Some(creator) = &self.creator {
            xmp.creator_tool(creator);
        }

        xmp.producer(self.producer_or_default());

        if let Some(date) = self.creation_date {
            xmp.create_date(xmp_date(date));
        }

        if let Some(date) = self.modification_date.or(self.creation_date) {
            xmp.modify_date(xmp_date(date));
        }

        xmp.format("application/pdf");
        xmp.document_id(document_id);
        xmp.instance_id(instance_id);
        xmp.pdfa_part(2);
        xmp.pdfa_conformance("B");

        xmp.finish(None)
    }
}

/// A datetime. Invalid values will be clamped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DateTime {
    /// The year (0-9999).
    pub(crate) year: u16,
    /// The month (1-12).
    pub(crate) month: Option<u8>,
    /// The day (1-31).
    pub(crate) day: Option<u8>,
    /// The hour (0-23).
    pub(crate) hour: Option<u8>,
    /// The minute (0-59).
    pub(crate) minute: Option<u8>,
    /// The second (0-59).
    pub(crate) second: Option<u8>,
    /// The hour offset from UTC (-23 through 23).
    pub(crate) utc_offset_hour: Option<i8>,
    /// The minute offset from UTC (0-59). Will carry over the sign from
    /// `utc_offset_hour`.
    pub(crate) utc_offset_minute: u8,
}

impl DateTime {
    /// Create a new, minimal date. The year will be clamped within the range
    /// 0-9999.
    #[inline]
    pub fn new(year: u16) -> Self {
        Self {
            year: year.min(9999),
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            utc_offset_hour: None,
            utc_offset_minute: 0,
        }
    }

    /// Add the month field. It will be clamped within the range 1-12.
    #[inline]
    pub fn month(mut self, month: u8) -> Self {
        self.month = Some(month.clamp(1, 12));
        self
    }

    /// Add the day field. It will be clamped within the range 1-31.
    #[inline]
    pub fn day(mut self, day: u8) -> Self {
        self.day = Some(day.clamp(1, 31));
        self
    }

    /// Add the hour field. It will be clamped within the range 0-23.
    #[inline]
    pub fn hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour.min(23));
        self
    }

    /// Add the minute field. It will be clamped within the range 0-59.
    #[inline]
    pub fn minute(mut self, minute: u8) -> Self {
        self.minute = Some(minute.min(59));
        self
    }

    /// Add the second field. It will be clamped within the range 0-59.
    #[inline]
    pub fn second(mut self, second: u8) -> Self {
        self.second = Some(second.min(59));
        self
    }

    /// Add the offset from UTC in hours. If not specified, the time is
    /// written as UTC. It will be clamped within the range -23-23.
    #[inline]
    pub fn utc_offset_hour(mut self, hour: i8) -> Self {
        self.utc_offset_hour = Some(hour.clamp(-23, 23));
        self
    }

    /// Add the offset from UTC in minutes. This will have the same sign as set in
    /// [`Self::utc_offset_hour`]. It will be clamped within the range 0-59.
    #[inline]
    pub fn utc_offset_minute(mut self, minute: u8) -> Self {
        self.utc_offset_minute = minute.min(59);
        self
    }
}

/// Formats a datetime as a PDF date string, `D:YYYYMMDDHHmmSSOHH'mm'`.
pub(crate) fn pdf_date(date_time: DateTime) -> String {
    let mut date = format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}",
        date_time.year,
        date_time.month.unwrap_or(1),
        date_time.day.unwrap_or(1),
        date_time.hour.unwrap_or(0),
        date_time.minute.unwrap_or(0),
        date_time.second.unwrap_or(0),
    );

    match date_time.utc_offset_hour {
        None | Some(0) if date_time.utc_offset_minute == 0 => date.push('Z'),
        hour => {
            let hour = hour.unwrap_or(0);
            let sign = if hour < 0 { '-' } else { '+' };
            let _ = write!(
                date,
                "{sign}{:02}'{:02}'",
                hour.unsigned_abs(),
                date_time.utc_offset_minute
            );
        }
    }

    date
}

/// Converts a datetime to an xmp-writer datetime.
fn xmp_date(datetime: DateTime) -> xmp_writer::DateTime {
    let timezone = match (datetime.utc_offset_hour, datetime.utc_offset_minute) {
        (Some(h), m) => Some(Timezone::Local {
            hour: h,
            minute: m as i8,
        }),
        _ => Some(Timezone::Utc),
    };

    xmp_writer::DateTime {
        year: datetime.year,
        month: Some(datetime.month.unwrap_or(1)),
        day: Some(datetime.day.unwrap_or(1)),
        hour: Some(datetime.hour.unwrap_or(0)),
        minute: Some(datetime.minute.unwrap_or(0)),
        second: Some(datetime.second.unwrap_or(0)),
        timezone,
    }
}
