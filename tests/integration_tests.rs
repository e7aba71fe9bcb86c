use bmp_lsb_hide::{
    StegoError,
    cli::{DecodeArgs, EncodeArgs},
    constants::BMP_HEADER_SIZE,
    handler::{handle_decode, handle_encode},
    validation::required_bytes,
};
use image::{Rgb, RgbImage};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的 24 位 BMP 测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf =
        RgbImage::from_raw(width, height, raw_pixels).expect("Pixel buffer has the wrong size.");
    img_buf.save(path).expect("Failed to create test image.");
}

fn encode_args(image: &Path, secret: &Path, dest: Option<PathBuf>, force: bool) -> EncodeArgs {
    EncodeArgs {
        image: image.to_path_buf(),
        secret: secret.to_path_buf(),
        dest,
        force,
    }
}

fn decode_args(image: &Path, output: &Path, force: bool) -> DecodeArgs {
    DecodeArgs {
        image: image.to_path_buf(),
        output: output.to_path_buf(),
        force,
    }
}

/// 验证从隐藏到恢复的完整流程：64x64 图像，hello.txt，输出名 out → out.txt
#[test]
fn test_handle_encode_and_decode_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let stego_image_path = dir.path().join("stego.bmp");
    let secret_path = dir.path().join("hello.txt");

    create_test_image(&original_image_path, 64, 64);
    fs::write(&secret_path, "hi there!\n")?;

    // 2. 测试 handle_encode
    let written = handle_encode(encode_args(
        &original_image_path,
        &secret_path,
        Some(stego_image_path.clone()),
        false,
    ))?;
    assert_eq!(written, stego_image_path);

    let original = fs::read(&original_image_path)?;
    let stego = fs::read(&stego_image_path)?;
    assert_eq!(original.len(), stego.len());
    assert_eq!(
        &original[..BMP_HEADER_SIZE],
        &stego[..BMP_HEADER_SIZE],
        "Bitmap header must be copied verbatim."
    );

    // 3. 测试 handle_decode
    let recovered_path = handle_decode(decode_args(
        &stego_image_path,
        &dir.path().join("out"),
        false,
    ))?;
    assert_eq!(recovered_path, dir.path().join("out.txt"));

    // 4. 验证结果
    assert_eq!(fs::read(&recovered_path)?, b"hi there!\n");

    Ok(())
}

/// 验证未提供输出路径时使用 default.bmp，以及输出名的扩展名会被替换
#[test]
fn test_handle_encode_and_decode_with_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let secret_path = dir.path().join("build.sh");

    create_test_image(&original_image_path, 100, 100);
    let script = "#!/bin/sh\necho 'hidden in plain sight'\n";
    fs::write(&secret_path, script)?;

    handle_encode(encode_args(&original_image_path, &secret_path, None, false))?;

    let expected_stego_path = dir.path().join("default.bmp");
    assert!(
        expected_stego_path.exists(),
        "Default stego image should be created at: {:?}",
        expected_stego_path
    );

    let recovered_path = handle_decode(decode_args(
        &expected_stego_path,
        &dir.path().join("recovered.txt"),
        false,
    ))?;
    assert_eq!(recovered_path, dir.path().join("recovered.sh"));
    assert_eq!(fs::read_to_string(&recovered_path)?, script);

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;

    // 场景一：目标文件已存在，不使用 --force
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_encode(encode_args(
        &image_path,
        &text_path,
        Some(dest_path.clone()),
        false,
    ));
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }
    assert_eq!(
        fs::read(&dest_path)?,
        b"this is a dummy file to be overwritten"
    );

    // 场景二：使用 --force 强制覆盖
    handle_encode(encode_args(
        &image_path,
        &text_path,
        Some(dest_path.clone()),
        true,
    ))?;
    assert_ne!(fs::read(&dest_path)?, b"this is a dummy file to be overwritten");

    // 恢复时同样受保护
    let recovered_path = dir.path().join("recovered.txt");
    fs::write(&recovered_path, "keep me")?;
    let result = handle_decode(decode_args(&dest_path, &dir.path().join("recovered"), false));
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&recovered_path)?, "keep me");

    handle_decode(decode_args(&dest_path, &dir.path().join("recovered"), true))?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "some text");

    Ok(())
}

/// 验证输出路径与载体是同一个文件时被拒绝，即使使用了 `--force`，载体也保持不变
#[test]
fn test_output_same_as_carrier_is_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("default.bmp");
    let text_path = dir.path().join("text.txt");

    create_test_image(&image_path, 200, 200);
    fs::write(&text_path, "some text")?;
    let original = fs::read(&image_path)?;

    // 默认输出名 default.bmp 恰好就是载体本身
    let err = handle_encode(encode_args(&image_path, &text_path, None, true))
        .expect_err("Encoding onto the carrier itself must fail.");
    assert!(err.to_string().contains("same file as the carrier"));
    assert_eq!(fs::read(&image_path)?, original, "Carrier must be untouched.");

    // 通过不同写法指向同一个文件
    let aliased = dir.path().join(".").join("default.bmp");
    let result = handle_encode(encode_args(&image_path, &text_path, Some(aliased), true));
    assert!(result.is_err());
    assert_eq!(fs::read(&image_path)?, original, "Carrier must be untouched.");

    Ok(())
}

/// 验证空间不足时的错误处理：2x2 图像只有 12 个像素字节
#[test]
fn test_handle_encode_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 2, 2);
    fs::write(&text_path, "a".repeat(100))?;

    let result = handle_encode(encode_args(
        &image_path,
        &text_path,
        Some(dest_path.clone()),
        false,
    ));

    let err = result.expect_err("Encoding must fail on a 2x2 carrier.");
    assert!(err.to_string().contains("Not enough space"));
    match err.downcast_ref::<StegoError>() {
        Some(StegoError::InsufficientCapacity {
            required,
            available,
        }) => {
            assert_eq!(*available, 12);
            assert_eq!(*required, required_bytes(4, 100));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dest_path.exists(), "No output should be created.");

    Ok(())
}

/// 验证扩展名不在允许列表中时，在打开任何文件之前就失败
#[test]
fn test_invalid_extension_is_rejected_before_io() {
    let dir = tempdir().expect("tempdir");
    let missing_image = dir.path().join("missing.bmp");
    let missing_secret = dir.path().join("payload.exe");

    let err = handle_encode(encode_args(&missing_image, &missing_secret, None, false))
        .expect_err("An .exe secret must be rejected.");
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::InvalidExtension { .. })
    ));

    let err = handle_encode(encode_args(
        &dir.path().join("missing.png"),
        &dir.path().join("notes.txt"),
        None,
        false,
    ))
    .expect_err("A non-bmp carrier must be rejected.");
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::InvalidExtension { .. })
    ));
}

/// 验证普通图像 (没有隐藏数据) 在魔数处被拒绝，且不会生成输出文件
#[test]
fn test_decode_plain_image_is_not_a_stego_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("plain.bmp");
    RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])).save(&image_path)?;

    let err = handle_decode(decode_args(&image_path, &dir.path().join("out"), false))
        .expect_err("A plain bitmap has no hidden data.");
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::NotAStegoImage)
    ));
    assert!(!dir.path().join("out.txt").exists());

    Ok(())
}

/// 验证隐写图像被截断时返回错误，并删除不完整的输出文件
#[test]
fn test_decode_truncated_image_discards_output() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.bmp");
    let secret_path = dir.path().join("data.csv");
    let stego_path = dir.path().join("stego.bmp");

    create_test_image(&image_path, 32, 32);
    fs::write(&secret_path, "a,b,c\n1,2,3\n")?;
    handle_encode(encode_args(
        &image_path,
        &secret_path,
        Some(stego_path.clone()),
        false,
    ))?;

    // 保留元数据和前 3 个数据字节，再多留半个字节
    let keep = BMP_HEADER_SIZE + 8 * (2 + 4 + 4 + 4) + 8 * 3 + 4;
    let stego = fs::read(&stego_path)?;
    fs::write(&stego_path, &stego[..keep])?;

    let err = handle_decode(decode_args(&stego_path, &dir.path().join("out"), false))
        .expect_err("Truncated payload must fail.");
    assert!(matches!(
        err.downcast_ref::<StegoError>(),
        Some(StegoError::TruncatedStegoImage { stage: "payload" })
    ));
    assert!(
        !dir.path().join("out.csv").exists(),
        "Partial output must be removed."
    );

    Ok(())
}
