/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制，隐写数据从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// BMP 头部中宽度字段的偏移 (小端 32 位)。
pub const BMP_WIDTH_OFFSET: usize = 18;

/// BMP 头部中高度字段的偏移 (小端 32 位，负数表示自上而下存储)。
pub const BMP_HEIGHT_OFFSET: usize = 22;

/// 每个像素占用的字节数 (24 位 BMP)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 标识隐写图像的魔数。
pub const MAGIC_MARKER: &[u8; 2] = b"#*";

/// 隐藏一个字节所需的像素字节数。
/// 每个像素字节只在最低位存储 1 bit，因此需要 8 个像素字节。
pub const BITS_PER_BYTE: usize = 8;

/// 隐藏一个 32 位长度字段所需的像素字节数。
pub const INT_FIELD_BYTES: usize = 32;

/// 载体图像必须使用的扩展名。
pub const CARRIER_EXTENSION: &str = ".bmp";

/// 允许隐藏的秘密文件扩展名 (纯文本、C 源码、表格、脚本)。
pub const ALLOWED_SECRET_EXTENSIONS: [&str; 4] = [".txt", ".c", ".csv", ".sh"];

/// 扩展名 (含 '.') 的最大长度，解码时超过该值直接视为损坏。
pub const MAX_EXTENSION_LEN: usize = 16;

/// 未指定输出路径时，隐写图像的默认文件名。
pub const DEFAULT_STEGO_NAME: &str = "default.bmp";

/// 交互模式下允许重新输入的最大次数。
pub const MAX_PROMPT_ATTEMPTS: usize = 3;
