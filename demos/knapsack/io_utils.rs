// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


use std::{fs::File, io::{BufRead, BufReader}, num::ParseFloatError, path::Path};

use crate::model::{Item, Knapsack};

/// This enumeration simply groups the kind of errors that might occur when parsing a
/// knapsack instance from file. There can be io errors (file unavailable ?), format error
/// (e.g. the file is not an instance but contains the text of your next paper),
/// or parse errors (the parser expected a number but got ... something else).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected to read a number but got some garbage
    #[error("parse number {0}")]
    ParseFloat(#[from] ParseFloatError),
    /// The file was not properly formatted.
    #[error("ill formed instance: {0}")]
    Format(&'static str),
}

/// Reads a knapsack instance. The first (non comment) line gives the number
/// of items and the capacity; each following line gives the profit and the
/// weight of one item. Lines starting with `#` are ignored.
pub fn read_instance<P: AsRef<Path>>(fname: P) -> Result<Knapsack, Error> {
    let f = BufReader::new(File::open(fname)?);
    parse(f)
}

/// Parses an instance from any buffered reader
pub fn parse<R: BufRead>(reader: R) -> Result<Knapsack, Error> {
    let mut numbers = vec![];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line.split_whitespace()
            .map(|x| x.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()?;
        numbers.push(row);
    }

    let mut rows = numbers.into_iter();
    let header = rows.next().ok_or(Error::Format("missing header"))?;
    if header.len() != 2 {
        return Err(Error::Format("the header must give the number of items and the capacity"));
    }
    let (n, capacity) = (header[0] as usize, header[1]);

    let mut items = vec![];
    for row in rows {
        if row.len() != 2 {
            return Err(Error::Format("an item is described by its profit and weight"));
        }
        if row[1] <= 0.0 {
            return Err(Error::Format("weights must be positive"));
        }
        items.push(Item { profit: row[0], weight: row[1] });
    }
    if items.len() != n {
        return Err(Error::Format("the number of items does not match the header"));
    }
    Ok(Knapsack { capacity, items })
}
