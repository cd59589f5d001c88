use bytes::{BufMut, Bytes, BytesMut};

use crate::buf::{put_string, FieldReader};
use crate::error::{Result, WireError};
use crate::record::{
    Answer, CameraDescriptor, CameraParameters, Command, ImageFrame, RecognizedObject,
};
use crate::tag::{
    C_CAMERA_GET_IMAGE, C_CAMERA_IMAGE, C_CAMERA_OBJECTS, C_CAMERA_RECONFIGURE,
    C_CAMERA_SET_FOCAL, C_CAMERA_SET_FOV, C_CAMERA_SET_RECOGNITION_PERIOD, C_CONFIGURE,
    C_SET_SAMPLING_PERIOD,
};

/// Append one outbound record.
///
/// ```text
/// SET_SAMPLING_PERIOD    u8 tag | u16 period
/// CAMERA_GET_IMAGE       u8 tag
/// CAMERA_SET_FOV         u8 tag | f64 fov
/// CAMERA_SET_FOCAL       u8 tag | f64 focal distance
/// SET_RECOGNITION_PERIOD u8 tag | u16 period
/// ```
pub fn encode_command(command: &Command, dst: &mut BytesMut) {
    dst.put_u8(command.tag());
    match command {
        Command::SetSamplingPeriod(period) | Command::SetRecognitionPeriod(period) => {
            dst.put_u16_le(*period)
        }
        Command::GetImage => {}
        Command::SetFov(value) | Command::SetFocalDistance(value) => dst.put_f64_le(*value),
    }
}

/// Decode one outbound record. Used by hosts and test doubles.
pub fn decode_command(src: &mut FieldReader) -> Result<Command> {
    let tag = src.read_u8("command tag")?;
    let command = match tag {
        C_SET_SAMPLING_PERIOD => Command::SetSamplingPeriod(src.read_u16("sampling period")?),
        C_CAMERA_GET_IMAGE => Command::GetImage,
        C_CAMERA_SET_FOV => Command::SetFov(src.read_f64("fov")?),
        C_CAMERA_SET_FOCAL => Command::SetFocalDistance(src.read_f64("focal distance")?),
        C_CAMERA_SET_RECOGNITION_PERIOD => {
            Command::SetRecognitionPeriod(src.read_u16("recognition period")?)
        }
        other => return Err(WireError::UnknownTag(other)),
    };
    Ok(command)
}

/// Append one inbound record. Used by hosts, fixtures and tests.
///
/// On error nothing is appended to `dst`.
pub fn encode_answer(answer: &Answer, dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    let result = put_answer(answer, dst);
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

fn put_answer(answer: &Answer, dst: &mut BytesMut) -> Result<()> {
    dst.put_u8(answer.tag());
    match answer {
        Answer::Configure(desc) => {
            dst.put_u32_le(desc.id);
            dst.put_u16_le(desc.width);
            dst.put_u16_le(desc.height);
            put_parameters(&desc.params, dst);
        }
        Answer::Reconfigure(params) => put_parameters(params, dst),
        Answer::Objects(objects) => put_objects(objects, dst)?,
        Answer::Image(frame) => {
            let expected = ImageFrame::expected_len(frame.width, frame.height);
            if frame.data.len() != expected {
                return Err(WireError::ImageSize {
                    width: frame.width,
                    height: frame.height,
                    expected,
                    actual: frame.data.len(),
                });
            }
            dst.put_u16_le(frame.width);
            dst.put_u16_le(frame.height);
            dst.put_slice(&frame.data);
        }
    }
    Ok(())
}

/// Decode one inbound record.
///
/// An unknown tag is returned as [`WireError::UnknownTag`]; the caller must
/// treat it as a desynchronized stream and stop decoding.
pub fn decode_answer(src: &mut FieldReader) -> Result<Answer> {
    let tag = src.read_u8("answer tag")?;
    let answer = match tag {
        C_CONFIGURE => {
            let id = src.read_u32("id")?;
            let width = src.read_u16("width")?;
            let height = src.read_u16("height")?;
            let params = read_parameters(src)?;
            Answer::Configure(CameraDescriptor {
                id,
                width,
                height,
                params,
            })
        }
        C_CAMERA_RECONFIGURE => Answer::Reconfigure(read_parameters(src)?),
        C_CAMERA_OBJECTS => Answer::Objects(read_objects(src)?),
        C_CAMERA_IMAGE => {
            let width = src.read_u16("image width")?;
            let height = src.read_u16("image height")?;
            let len = ImageFrame::expected_len(width, height);
            let data = src.read_bytes("image data", len)?;
            Answer::Image(ImageFrame {
                width,
                height,
                data,
            })
        }
        other => return Err(WireError::UnknownTag(other)),
    };
    Ok(answer)
}

/// Decode every record in a device payload.
pub fn decode_answers(payload: Bytes) -> Result<Vec<Answer>> {
    let mut src = FieldReader::new(payload);
    let mut answers = Vec::new();
    while !src.is_empty() {
        answers.push(decode_answer(&mut src)?);
    }
    Ok(answers)
}

/// Decode every record in a device request payload.
pub fn decode_commands(payload: Bytes) -> Result<Vec<Command>> {
    let mut src = FieldReader::new(payload);
    let mut commands = Vec::new();
    while !src.is_empty() {
        commands.push(decode_command(&mut src)?);
    }
    Ok(commands)
}

fn put_parameters(params: &CameraParameters, dst: &mut BytesMut) {
    dst.put_f64_le(params.fov);
    dst.put_f64_le(params.near);
    dst.put_u8(u8::from(params.spherical));
    dst.put_f64_le(params.min_fov);
    dst.put_f64_le(params.max_fov);
    dst.put_u8(u8::from(params.has_recognition));
    dst.put_f64_le(params.focal_length);
    dst.put_f64_le(params.focal_distance);
    dst.put_f64_le(params.min_focal_distance);
    dst.put_f64_le(params.max_focal_distance);
}

fn read_parameters(src: &mut FieldReader) -> Result<CameraParameters> {
    Ok(CameraParameters {
        fov: src.read_f64("fov")?,
        near: src.read_f64("near")?,
        spherical: src.read_bool("spherical")?,
        min_fov: src.read_f64("min fov")?,
        max_fov: src.read_f64("max fov")?,
        has_recognition: src.read_bool("has recognition")?,
        focal_length: src.read_f64("focal length")?,
        focal_distance: src.read_f64("focal distance")?,
        min_focal_distance: src.read_f64("min focal distance")?,
        max_focal_distance: src.read_f64("max focal distance")?,
    })
}

fn put_count(len: usize, field: &'static str, dst: &mut BytesMut) -> Result<()> {
    let count = i32::try_from(len).map_err(|_| {
        tracing::warn!(field, len, "count does not fit the wire format");
        WireError::PayloadTooLarge {
            size: len,
            max: i32::MAX as usize,
        }
    })?;
    dst.put_i32_le(count);
    Ok(())
}

fn put_objects(objects: &[RecognizedObject], dst: &mut BytesMut) -> Result<()> {
    put_count(objects.len(), "object", dst)?;
    for object in objects {
        dst.put_i32_le(object.id);
        for v in object.position.iter().chain(&object.orientation).chain(&object.size) {
            dst.put_f64_le(*v);
        }
        for v in object.position_on_image.iter().chain(&object.size_on_image) {
            dst.put_i32_le(*v);
        }
        put_count(object.colors.len(), "color", dst)?;
        for color in &object.colors {
            for channel in color {
                dst.put_f64_le(*channel);
            }
        }
        put_string(dst, "object model", &object.model)?;
    }
    Ok(())
}

fn read_objects(src: &mut FieldReader) -> Result<Vec<RecognizedObject>> {
    let count = src.read_count("object")?;
    // Each object needs at least 97 bytes; cap the reservation by what is left.
    let mut objects = Vec::with_capacity(count.min(src.remaining() / 97));
    for _ in 0..count {
        let id = src.read_i32("object id")?;
        let position = src.read_f64_array::<3>("object position")?;
        let orientation = src.read_f64_array::<4>("object orientation")?;
        let size = src.read_f64_array::<2>("object size")?;
        let position_on_image = src.read_i32_array::<2>("object position on image")?;
        let size_on_image = src.read_i32_array::<2>("object size on image")?;
        let color_count = src.read_count("color")?;
        let mut colors = Vec::with_capacity(color_count.min(src.remaining() / 24));
        for _ in 0..color_count {
            colors.push(src.read_f64_array::<3>("object color")?);
        }
        let model = src.read_string("object model")?;
        objects.push(RecognizedObject {
            id,
            position,
            orientation,
            size,
            position_on_image,
            size_on_image,
            colors,
            model,
        });
    }
    Ok(objects)
}
