//! nom parsers shared by every encoded format.

use std::str::FromStr;

use nom::{
    bytes::complete::tag,
    combinator::{map_res, rest},
    multi::length_data,
    number::complete::{be_u16, be_u32},
    sequence::terminated,
    IResult,
};

use super::SEPARATOR;
use crate::digest::Digest;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

/// Split an encoded file into its body and signature.
pub(crate) fn split_header(bytes: &[u8]) -> Result<(&[u8], u16)> {
    let (_, (signature, body)) = finish("header", header_and_rest(bytes))?;
    Ok((body, signature))
}

fn header_and_rest(input: &[u8]) -> IResult<&[u8], (u16, &[u8])> {
    let (input, signature) = terminated(be_u16, tag(&[SEPARATOR][..]))(input)?;
    let (input, body) = rest(input)?;
    Ok((input, (signature, body)))
}

/// A big-endian `u32` length followed by that many bytes.
pub(crate) fn prefixed(input: &[u8]) -> IResult<&[u8], &[u8]> {
    length_data(be_u32)(input)
}

pub(crate) fn prefixed_str(input: &[u8]) -> IResult<&[u8], &str> {
    map_res(prefixed, std::str::from_utf8)(input)
}

pub(crate) fn prefixed_digest(input: &[u8]) -> IResult<&[u8], Digest> {
    map_res(prefixed_str, Digest::from_str)(input)
}

/// Like [`prefixed_digest`], but an empty string decodes to `None`.
pub(crate) fn prefixed_optional_digest(input: &[u8]) -> IResult<&[u8], Option<Digest>> {
    map_res(prefixed_str, |s| match s {
        "" => Ok(None),
        s => Digest::from_str(s).map(Some),
    })(input)
}

pub(crate) fn prefixed_timestamp(input: &[u8]) -> IResult<&[u8], Timestamp> {
    map_res(prefixed, Timestamp::from_bytes)(input)
}

pub(crate) fn kind_tag(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

/// Turn the outcome of a complete parse into a crate error. Running out of input part-way
/// through is corruption, the same as any other parse failure.
pub(crate) fn finish<'a, T>(
    what: &'static str,
    result: IResult<&'a [u8], T>,
) -> Result<(&'a [u8], T)> {
    match result {
        Ok(ok) => Ok(ok),
        Err(nom::Err::Incomplete(needed)) => Err(Error::Corrupt {
            what,
            reason: format!("unexpected end of input ({needed:?})"),
        }),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(Error::Corrupt {
            what,
            reason: format!("{:?} with {} bytes left", e.code, e.input.len()),
        }),
    }
}
