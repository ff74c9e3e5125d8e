use std::io::BufRead;

use thiserror::Error;

use crate::data::*;
use crate::tags::*;
use crate::Result;

pub type XmlTree = xmltree::Element;

// upper bound on entries reserved up front, independent of the counts in the file
const MAX_PREALLOC: usize = 1024;

/// Reader for the LHEF format
#[derive(Debug)]
pub struct Reader<T> {
    stream: T,
    version: &'static str,
    header: String,
    xml_header: Option<XmlTree>,
    heprup: HEPRUP,
}

/// Malformed LHEF input
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("First line '{0}' in input does not start with '{}'", LHEF_TAG_OPEN)]
    BadFirstLine(String),
    #[error(
        "Encountered unrecognized line '{0}', expected a header starting with \
         '{}', '{}', or the init block starting with '{}'",
        COMMENT_START, HEADER_START, INIT_START
    )]
    BadHeaderStart(String),
    #[error("Encountered malformed xml tag: '{0}'")]
    BadXmlTag(String),
    #[error(
        "Encountered unrecognized line '{0}', expected an event starting with '{}'",
        EVENT_START
    )]
    BadEventStart(String),
    #[error("Missing entry '{0}'")]
    MissingEntry(String),
    #[error("Failed to convert to number: '{0}'")]
    ConversionError(String),
    #[error("Unsupported version {0}, only 1.0, 2.0, 3.0 are supported")]
    UnsupportedVersion(String),
    #[error("Version information missing")]
    MissingVersion,
    #[error("Encountered '{0}' block without closing tag")]
    EndOfFile(&'static str),
}

impl<T: BufRead> Reader<T> {
    /// Create a new LHEF reader
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let file = std::fs::File::open("events.lhe").unwrap();
    /// let file = std::io::BufReader::new(file);
    /// let reader = rapgap::Reader::new(file).unwrap();
    /// ```
    pub fn new(mut stream: T) -> Result<Reader<T>> {
        let version = parse_version(&mut stream)?;
        let (header, xml_header, init_start) = parse_header(&mut stream)?;
        let heprup = parse_init(&init_start, &mut stream)?;
        Ok(Reader {
            stream,
            version,
            header,
            xml_header,
            heprup,
        })
    }

    /// Get the LHEF version
    pub fn version(&self) -> &str {
        self.version
    }

    /// Get the LHEF header
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Get the LHEF xml header
    pub fn xml_header(&self) -> Option<&XmlTree> {
        self.xml_header.as_ref()
    }

    /// Get the run information in HEPRUP format
    pub fn heprup(&self) -> &HEPRUP {
        &self.heprup
    }

    /// Get the next event in HEPEUP format
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let file = std::fs::File::open("events.lhe").unwrap();
    /// let file = std::io::BufReader::new(file);
    /// let mut reader = rapgap::Reader::new(file).unwrap();
    ///
    /// let event = reader.hepeup().unwrap();
    /// match event {
    ///    Some(event) => println!("Found an event."),
    ///    None => println!("Reached end of event file."),
    /// }
    /// ```
    pub fn hepeup(&mut self) -> Result<Option<HEPEUP>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stream.read_line(&mut line)? == 0 {
                return Err(ParseError::EndOfFile("LesHouchesEvents").into());
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        if line.trim_start().starts_with(EVENT_START) {
            Ok(Some(parse_event(&line, &mut self.stream)?))
        } else if line.trim() == LHEF_LAST_LINE {
            Ok(None)
        } else {
            Err(ParseError::BadEventStart(line).into())
        }
    }
}

fn parse_version<T: BufRead>(stream: &mut T) -> Result<&'static str> {
    use self::ParseError::*;
    let mut first_line = String::new();
    stream.read_line(&mut first_line)?;
    let mut line_entries = first_line.trim().split('"');
    if line_entries.next() != Some(LHEF_TAG_OPEN) {
        return Err(BadFirstLine(first_line).into());
    };
    let version = match line_entries.next() {
        Some("1.0") => "1.0",
        Some("2.0") => "2.0",
        Some("3.0") => "3.0",
        Some(version) => return Err(UnsupportedVersion(version.to_string()).into()),
        None => return Err(MissingVersion.into()),
    };
    if line_entries.next() != Some(">") {
        return Err(BadFirstLine(first_line).into());
    };
    Ok(version)
}

fn parse_header<T: BufRead>(stream: &mut T) -> Result<(String, Option<XmlTree>, String)> {
    use self::ParseError::BadHeaderStart;
    let mut header = String::new();
    let mut xml_header = None;
    loop {
        let mut header_text = String::new();
        if stream.read_line(&mut header_text)? == 0 {
            return Err(ParseError::EndOfFile("init").into());
        }
        let start = header_text.trim_start();
        if start.is_empty() {
            continue;
        }
        if start.starts_with(COMMENT_START) {
            if header_text.trim() != COMMENT_START {
                return Err(BadHeaderStart(header_text).into());
            }
            read_lines_until(stream, &mut header_text, COMMENT_END, "header")?;
            header = header_text;
        } else if start.starts_with(HEADER_START) {
            read_lines_until(stream, &mut header_text, HEADER_END, "header")?;
            xml_header = Some(XmlTree::parse(header_text.as_bytes())?);
        } else if start.starts_with(INIT_START) {
            return Ok((header, xml_header, header_text));
        } else {
            return Err(BadHeaderStart(header_text).into());
        }
    }
}

/// Remove the last line
fn pop_line(s: &mut String) {
    let keep = {
        let body = s.strip_suffix('\n').unwrap_or(s);
        body.rfind('\n').map_or(0, |idx| idx + 1)
    };
    s.truncate(keep);
}

fn last_line_is(text: &str, tag: &str) -> bool {
    text.lines().last().map(str::trim) == Some(tag)
}

fn read_lines_until<T: BufRead>(
    stream: &mut T,
    text: &mut String,
    end_tag: &str,
    block: &'static str,
) -> Result<()> {
    loop {
        if stream.read_line(text)? == 0 {
            return Err(ParseError::EndOfFile(block).into());
        }
        if last_line_is(text, end_tag) {
            return Ok(());
        }
    }
}

fn entry<'a>(name: &str, text: Option<&'a str>) -> std::result::Result<&'a str, ParseError> {
    text.ok_or_else(|| ParseError::MissingEntry(name.to_owned()))
}

fn parse_int(name: &str, text: Option<&str>) -> std::result::Result<i32, ParseError> {
    let text = entry(name, text)?;
    text.parse()
        .map_err(|_| ParseError::ConversionError(text.to_owned()))
}

fn parse_float(name: &str, text: Option<&str>) -> std::result::Result<f64, ParseError> {
    let text = entry(name, text)?;
    fast_float::parse(text).map_err(|_| ParseError::ConversionError(text.to_owned()))
}

fn extract_xml_attr_str(xml_tag: &str) -> std::result::Result<&str, ParseError> {
    let tag = xml_tag.trim();
    let Some(tag) = tag.strip_suffix('>') else {
        return Err(ParseError::BadXmlTag(xml_tag.to_owned()));
    };
    match tag.find(char::is_whitespace) {
        None => Ok(""),
        Some(idx) => Ok(tag[idx + 1..].trim_start()),
    }
}

struct Attr<'a> {
    name: &'a str,
    value: &'a str,
}

fn next_attr(attr_str: &str) -> std::result::Result<(Option<Attr<'_>>, &str), ParseError> {
    use self::ParseError::BadXmlTag;
    let bad_tag = || BadXmlTag(attr_str.to_owned());
    let name_end = attr_str.find(|c: char| c.is_whitespace() || c == '=');
    let name = match name_end {
        None => return Ok((None, attr_str)),
        Some(idx) => &attr_str[..idx],
    };
    let rem = attr_str[name.len()..].trim_start();
    let rem = rem.strip_prefix('=').ok_or_else(bad_tag)?.trim_start();
    let quote = match rem.chars().next() {
        Some(quote @ ('\'' | '"')) => quote,
        _ => return Err(bad_tag()),
    };
    let rem = &rem[1..];
    let value_end = rem.find(quote).ok_or_else(bad_tag)?;
    let value = &rem[..value_end];
    let rem = rem[value_end + 1..].trim_start();
    Ok((Some(Attr { name, value }), rem))
}

fn extract_xml_attr(xml_tag: &str) -> std::result::Result<XmlAttr, ParseError> {
    let mut attr_str = extract_xml_attr_str(xml_tag)?;
    let mut attr = XmlAttr::new();
    loop {
        let (parsed, rem) = next_attr(attr_str)?;
        match parsed {
            None => return Ok(attr),
            Some(next_attr) => {
                attr.insert(next_attr.name.to_string(), next_attr.value.to_string());
            }
        };
        attr_str = rem;
    }
}

/// Read lines up to the closing tag, which is dropped
fn read_info<T: BufRead>(
    stream: &mut T,
    end_tag: &str,
    block: &'static str,
) -> Result<String> {
    let mut info = String::new();
    read_lines_until(stream, &mut info, end_tag, block)?;
    pop_line(&mut info);
    Ok(info)
}

#[allow(non_snake_case)]
fn parse_init<T: BufRead>(init_open: &str, stream: &mut T) -> Result<HEPRUP> {
    let mut line = String::new();
    stream.read_line(&mut line)?;
    let mut entries = line.split_whitespace();
    let IDBMUP = [
        parse_int("IDBMUP(1)", entries.next())?,
        parse_int("IDBMUP(2)", entries.next())?,
    ];
    let EBMUP = [
        parse_float("EBMUP(1)", entries.next())?,
        parse_float("EBMUP(2)", entries.next())?,
    ];
    let PDFGUP = [
        parse_int("PDFGUP(1)", entries.next())?,
        parse_int("PDFGUP(2)", entries.next())?,
    ];
    let PDFSUP = [
        parse_int("PDFSUP(1)", entries.next())?,
        parse_int("PDFSUP(2)", entries.next())?,
    ];
    let IDWTUP = parse_int("IDWTUP", entries.next())?;
    let NPRUP = parse_int("NPRUP", entries.next())?;
    let num_sub = NPRUP.max(0) as usize;
    let capacity = num_sub.min(MAX_PREALLOC);
    let mut XSECUP = Vec::with_capacity(capacity);
    let mut XERRUP = Vec::with_capacity(capacity);
    let mut XMAXUP = Vec::with_capacity(capacity);
    let mut LPRUP = Vec::with_capacity(capacity);
    for i in 1..=num_sub {
        let mut line = String::new();
        stream.read_line(&mut line)?;
        let mut entries = line.split_whitespace();
        XSECUP.push(parse_float(&format!("XSECUP({i})"), entries.next())?);
        XERRUP.push(parse_float(&format!("XERRUP({i})"), entries.next())?);
        XMAXUP.push(parse_float(&format!("XMAXUP({i})"), entries.next())?);
        LPRUP.push(parse_int(&format!("LPRUP({i})"), entries.next())?);
    }
    let info = read_info(stream, INIT_END, "init")?;
    let attr = extract_xml_attr(init_open)?;
    Ok(HEPRUP {
        IDBMUP,
        EBMUP,
        PDFGUP,
        PDFSUP,
        IDWTUP,
        NPRUP,
        XSECUP,
        XERRUP,
        XMAXUP,
        LPRUP,
        info,
        attr,
    })
}

#[allow(non_snake_case)]
fn parse_event<T: BufRead>(event_open: &str, stream: &mut T) -> Result<HEPEUP> {
    let mut line = String::new();
    stream.read_line(&mut line)?;
    let mut entries = line.split_whitespace();
    let NUP = parse_int("NUP", entries.next())?;
    let IDRUP = parse_int("IDRUP", entries.next())?;
    let XWGTUP = parse_float("XWGTUP", entries.next())?;
    let SCALUP = parse_float("SCALUP", entries.next())?;
    let AQEDUP = parse_float("AQEDUP", entries.next())?;
    let AQCDUP = parse_float("AQCDUP", entries.next())?;
    let num_particles = NUP.max(0) as usize;
    let capacity = num_particles.min(MAX_PREALLOC);
    let mut IDUP = Vec::with_capacity(capacity);
    let mut ISTUP = Vec::with_capacity(capacity);
    let mut MOTHUP = Vec::with_capacity(capacity);
    let mut ICOLUP = Vec::with_capacity(capacity);
    let mut PUP = Vec::with_capacity(capacity);
    let mut VTIMUP = Vec::with_capacity(capacity);
    let mut SPINUP = Vec::with_capacity(capacity);
    for i in 1..=num_particles {
        line.clear();
        stream.read_line(&mut line)?;
        let mut entries = line.split_whitespace();
        IDUP.push(parse_int(&format!("IDUP({i})"), entries.next())?);
        ISTUP.push(parse_int(&format!("ISTUP({i})"), entries.next())?);
        MOTHUP.push([
            parse_int(&format!("MOTHUP({i}, 1)"), entries.next())?,
            parse_int(&format!("MOTHUP({i}, 2)"), entries.next())?,
        ]);
        ICOLUP.push([
            parse_int(&format!("ICOLUP({i}, 1)"), entries.next())?,
            parse_int(&format!("ICOLUP({i}, 2)"), entries.next())?,
        ]);
        let mut p = [0.; 5];
        for (j, p) in p.iter_mut().enumerate() {
            *p = parse_float(&format!("PUP({i}, {})", j + 1), entries.next())?;
        }
        PUP.push(p);
        VTIMUP.push(parse_float(&format!("VTIMUP({i})"), entries.next())?);
        SPINUP.push(parse_float(&format!("SPINUP({i})"), entries.next())?);
    }
    let info = read_info(stream, EVENT_END, "event")?;
    let attr = extract_xml_attr(event_open)?;
    Ok(HEPEUP {
        NUP,
        IDRUP,
        XWGTUP,
        SCALUP,
        AQEDUP,
        AQCDUP,
        IDUP,
        ISTUP,
        MOTHUP,
        ICOLUP,
        PUP,
        VTIMUP,
        SPINUP,
        info,
        attr,
    })
}
